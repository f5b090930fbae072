use regex::Regex;

use crate::error::ConfigError;

const MB_PER_GB: f64 = 1024.0;

/// Control-plane capacities are reported in MB.
pub fn mb_to_gb(mb: f64) -> f64 {
    mb / MB_PER_GB
}

/// Used share of a capacity as a percentage, `None` when the total is unknown or zero.
pub fn usage_percent(used: f64, total: f64) -> Option<f64> {
    if total > 0.0 {
        Some(used / total * 100.0)
    } else {
        None
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// Shell-style wildcard over deployment names: `*` matches any run of
/// characters, `?` exactly one. Everything else is literal.
#[derive(Debug, Clone)]
pub struct NameFilter {
    pattern: String,
    regex: Regex,
}

impl NameFilter {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let mut re = String::with_capacity(pattern.len() + 8);
        re.push('^');
        let mut literal = String::new();
        for ch in pattern.chars() {
            match ch {
                '*' | '?' => {
                    re.push_str(&regex::escape(&literal));
                    literal.clear();
                    re.push_str(if ch == '*' { ".*" } else { "." });
                }
                _ => literal.push(ch),
            }
        }
        re.push_str(&regex::escape(&literal));
        re.push('$');

        let regex = Regex::new(&re).map_err(|e| ConfigError::Invalid {
            key: "DEPLOYMENT_FILTER",
            message: e.to_string(),
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn matches_everything(&self) -> bool {
        self.pattern.chars().all(|c| c == '*')
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}
