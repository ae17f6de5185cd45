use crate::results::ResultRecord;
use serde::Serialize;

/// What happens to previously stored records when a new run is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulationPolicy {
    /// Each `consume` starts from an empty store.
    ResetPerRun,
    /// Records from successive runs are appended to one store.
    Accumulate,
}

/// Records of a run in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultStore {
    records: Vec<ResultRecord>,
}

impl ResultStore {
    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn credential_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_diagnostic()).count()
    }

    pub fn diagnostic_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_diagnostic()).count()
    }

    /// Records grouped by (category, module) in first-seen order.
    pub fn by_module(&self) -> Vec<ModuleGroup<'_>> {
        let mut groups: Vec<ModuleGroup<'_>> = Vec::new();
        for record in &self.records {
            match groups
                .iter()
                .position(|g| g.category == record.category && g.module == record.module)
            {
                Some(index) => groups[index].records.push(record),
                None => groups.push(ModuleGroup {
                    category: &record.category,
                    module: &record.module,
                    records: vec![record],
                }),
            }
        }
        groups
    }
}

#[derive(Debug)]
pub struct ModuleGroup<'a> {
    pub category: &'a str,
    pub module: &'a str,
    pub records: Vec<&'a ResultRecord>,
}

/// Pure accumulator between the runner and the output writers.
#[derive(Debug)]
pub struct ResultAggregator {
    policy: AccumulationPolicy,
    store: ResultStore,
}

impl ResultAggregator {
    pub fn new(policy: AccumulationPolicy) -> Self {
        Self {
            policy,
            store: ResultStore::default(),
        }
    }

    /// Append every record in arrival order; returns how many were appended.
    pub fn consume<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = ResultRecord>,
    {
        self.consume_with(records, |_| {})
    }

    /// Like [`consume`](Self::consume), calling `observer` on each record
    /// before it is stored.
    pub fn consume_with<I, F>(&mut self, records: I, mut observer: F) -> usize
    where
        I: IntoIterator<Item = ResultRecord>,
        F: FnMut(&ResultRecord),
    {
        if self.policy == AccumulationPolicy::ResetPerRun {
            self.reset();
        }

        let before = self.store.records.len();
        for record in records {
            observer(&record);
            self.store.records.push(record);
        }
        self.store.records.len() - before
    }

    pub fn snapshot(&self) -> &ResultStore {
        &self.store
    }

    pub fn into_store(self) -> ResultStore {
        self.store
    }

    pub fn reset(&mut self) {
        self.store.records.clear();
    }
}
