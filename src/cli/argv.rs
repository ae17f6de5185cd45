use std::collections::HashSet;
use std::ffi::OsString;

/// Rewrite single-dash long options (`-quiet`, `-oN`, `-firefox`) into the
/// `--` form understood by the parser.
///
/// The first element is the program name and is kept as is. Short clusters of
/// `-v` stay short, the token following a value-taking option is never
/// touched, and everything after `--` passes through.
pub fn normalize_args<I, T>(args: I, value_options: &HashSet<String>) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut normalized = Vec::new();
    let mut expecting_value = false;
    let mut passthrough = false;

    for (index, arg) in args.into_iter().enumerate() {
        let arg: OsString = arg.into();
        if index == 0 || passthrough || expecting_value {
            expecting_value = false;
            normalized.push(arg);
            continue;
        }

        let Some(token) = arg.to_str() else {
            normalized.push(arg);
            continue;
        };

        if token == "--" {
            passthrough = true;
            normalized.push(arg);
            continue;
        }

        let long = if let Some(rest) = token.strip_prefix("--") {
            Some(rest.to_string())
        } else if token.starts_with('-') && token.len() > 2 && !is_short_cluster(token) {
            Some(token[1..].to_string())
        } else {
            None
        };

        match long {
            Some(rest) => {
                let name = rest.split('=').next().unwrap_or_default();
                expecting_value = !rest.contains('=') && value_options.contains(name);
                normalized.push(OsString::from(format!("--{}", rest)));
            }
            None => normalized.push(arg),
        }
    }

    normalized
}

fn is_short_cluster(token: &str) -> bool {
    token.len() > 1 && token[1..].chars().all(|c| c == 'v')
}
