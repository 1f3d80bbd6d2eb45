//! Config validation: syntax, unknown keys (with suggestions), types, and
//! semantic checks on the gotify/destination settings.

use std::{collections::HashMap, path::Path};

use crate::{env_subst::substitute_env, schema::HeraldConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "missing", "url"
    pub category: &'static str,
    /// Dotted path, e.g. "gotify.server"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    /// Free-form subtree handed to a channel crate.
    Any,
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Any, Leaf, Struct};

    Struct(HashMap::from([
        ("applications", Leaf),
        ("destinations", Leaf),
        (
            "gotify",
            Struct(HashMap::from([
                ("server", Leaf),
                ("token", Leaf),
                ("reconnect_delay_secs", Leaf),
            ])),
        ),
        ("channels", Struct(HashMap::from([("telegram", Any)]))),
    ]))
}

/// Levenshtein edit distance, used for "did you mean" hints.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    if a.is_empty() {
        return b_len;
    }
    if b.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_len]
}

fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (c, levenshtein(needle, c)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(c, _)| c)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or the discovered default file
/// if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                category: "missing",
                path: String::new(),
                message: "no config file found".into(),
            }],
            config_path: None,
        };
    };

    let is_toml = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .is_none_or(|e| e == "toml");

    match std::fs::read_to_string(actual_path) {
        Ok(content) if is_toml => {
            let mut result = validate_toml_str(&substitute_env(&content));
            result.config_path = Some(actual_path.clone());
            result
        },
        Ok(_) => {
            // Non-TOML formats: only the typed checks apply.
            let mut diagnostics = Vec::new();
            match crate::loader::load_config(actual_path) {
                Ok(config) => check_semantics(&config, &mut diagnostics),
                Err(e) => diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    category: "type-error",
                    path: String::new(),
                    message: e.to_string(),
                }),
            }
            ValidationResult {
                diagnostics,
                config_path: Some(actual_path.clone()),
            }
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("failed to read config file: {e}"),
            }],
            config_path: Some(actual_path.clone()),
        },
    }
}

/// Validate a TOML string without touching the file system.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("TOML syntax error: {e}"),
            });
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&toml_value, &build_schema_map(), "", &mut diagnostics);

    match toml::from_str::<HeraldConfig>(toml_str) {
        Ok(config) => check_semantics(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: String::new(),
            message: format!("type error: {e}"),
        }),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (toml::Value::Table(table), KnownKeys::Struct(fields)) = (value, schema) else {
        return;
    };
    let known: Vec<&str> = fields.keys().copied().collect();

    for (key, child) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match fields.get(key.as_str()) {
            Some(child_schema) => check_unknown_fields(child, child_schema, &path, diagnostics),
            None => {
                let message = match suggest(key, &known, 3) {
                    Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
                    None => "unknown field".to_string(),
                };
                diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    category: "unknown-field",
                    path,
                    message,
                });
            },
        }
    }
}

fn check_semantics(config: &HeraldConfig, diagnostics: &mut Vec<Diagnostic>) {
    let server = config.gotify.server.trim();
    if server.is_empty() {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "missing",
            path: "gotify.server".into(),
            message: "gotify server URL is required".into(),
        });
    } else if server.contains("${") {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "missing",
            path: "gotify.server".into(),
            message: "unresolved environment variable".into(),
        });
    } else {
        match url::Url::parse(server) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {},
            Ok(url) => diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "url",
                path: "gotify.server".into(),
                message: format!("unsupported scheme \"{}\" (use http or https)", url.scheme()),
            }),
            Err(e) => diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "url",
                path: "gotify.server".into(),
                message: format!("invalid URL: {e}"),
            }),
        }
    }

    if !config.gotify.has_token() {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "missing",
            path: "gotify.token".into(),
            message: "gotify client token is required".into(),
        });
    }

    if config.gotify.reconnect_delay_secs == 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "type-error",
            path: "gotify.reconnect_delay_secs".into(),
            message: "zero delay reconnects in a tight loop against a silent server".into(),
        });
    }

    if config.destinations.is_empty() {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "missing",
            path: "destinations".into(),
            message: "no destinations registered; notifications will be dropped".into(),
        });
    }

    if config.applications.is_empty() {
        diagnostics.push(Diagnostic {
            severity: Severity::Info,
            category: "missing",
            path: "applications".into(),
            message: "empty allow-list forwards every application".into(),
        });
    }
}
