use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Names of the runtime entities the passes emit. The defaults target HClib;
/// a JSON file passed with `--config` may override any subset of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pragma namespace lowered by the passes (`#pragma omp ...`).
    pub namespace: String,
    /// Tool-internal namespace carrying `body_start` / `body_end`.
    pub internal_namespace: String,
    /// Function called in place of a generically handled pragma.
    pub marker_function: String,
    /// Replacement text for a handled `taskwait`.
    pub barrier: String,
    pub lock_type: String,
    pub lock_initializer: String,
    /// Lines that must open the input of `insert-locks`, in order.
    pub expected_header: Vec<String>,
    /// Preprocessor macro selecting untied tasks.
    pub untied_macro: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: "omp".to_string(),
            internal_namespace: "omp_to_hclib".to_string(),
            marker_function: "hclib_pragma_marker".to_string(),
            barrier: "hclib_end_finish(); hclib_start_finish();".to_string(),
            lock_type: "pthread_mutex_t".to_string(),
            lock_initializer: "PTHREAD_RECURSIVE_MUTEX_INITIALIZER_NP".to_string(),
            expected_header: [
                "#include \"hclib.h\"",
                "#ifdef __cplusplus",
                "#include \"hclib_cpp.h\"",
                "#include \"hclib_system.h\"",
                "#include \"hclib_openshmem.h\"",
                "#ifdef __CUDACC__",
                "#include \"hclib_cuda.h\"",
                "#endif",
                "#endif",
                "extern void hclib_pragma_marker(const char *pragma_name, const char *pragma_arguments);",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            untied_macro: "HCLIB_TASK_UNTIED".to_string(),
        }
    }
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        for (key, value) in [
            ("namespace", &config.namespace),
            ("internal_namespace", &config.internal_namespace),
        ] {
            if value.split_whitespace().count() != 1 {
                return Err(Error::malformed(
                    &path.display().to_string(),
                    1,
                    format!("`{key}` must be a single token"),
                ));
            }
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
