//! Taint source/sink configuration
//!
//! `Q.Source`/`Q.Sink` resolve against this configuration: categories map
//! to sets of simple callee names, YAML atoms carry ids for externally
//! maintained rule packs. Type-aware atom matching lives in the taint
//! service, not in the query DSL.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AtomKind {
    Source,
    Sink,
    Sanitizer,
}

/// One externally defined taint atom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaintAtom {
    pub id: String,
    pub kind: AtomKind,
    #[serde(default)]
    pub category: Option<String>,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
struct AtomFile {
    #[serde(default)]
    atoms: Vec<TaintAtom>,
}

#[derive(Debug, Clone, Default)]
pub struct TaintConfig {
    sources: HashMap<String, Vec<String>>,
    sinks: HashMap<String, Vec<String>>,
    sanitizers: HashMap<String, Vec<String>>,
    atoms: HashMap<String, TaintAtom>,
}

impl TaintConfig {
    /// Built-in categories.
    pub fn default_config() -> Self {
        let mut config = Self::default();

        config.sources.insert(
            "request".into(),
            str_vec(&["input", "request", "get", "post", "form"]),
        );
        config
            .sources
            .insert("file".into(), str_vec(&["open", "read", "readline", "readlines"]));
        config
            .sources
            .insert("env".into(), str_vec(&["environ", "getenv", "argv"]));
        config
            .sources
            .insert("socket".into(), str_vec(&["socket", "recv", "accept"]));
        config.sources.insert(
            "database".into(),
            str_vec(&["query", "fetchone", "fetchall"]),
        );

        config.sinks.insert(
            "execute".into(),
            str_vec(&["eval", "exec", "system", "subprocess", "popen"]),
        );
        config
            .sinks
            .insert("sql".into(), str_vec(&["execute", "executemany", "query"]));
        config
            .sinks
            .insert("file".into(), str_vec(&["write", "writelines", "dump"]));
        config
            .sinks
            .insert("log".into(), str_vec(&["logger", "print", "log"]));
        config
            .sinks
            .insert("network".into(), str_vec(&["send", "sendto"]));

        config.sanitizers.insert(
            "sql".into(),
            str_vec(&["escape_sql", "quote", "parameterize"]),
        );
        config
            .sanitizers
            .insert("html".into(), str_vec(&["escape", "sanitize_html"]));

        config
    }

    /// Extend the default config with atoms from a YAML rule pack.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: AtomFile = serde_yaml::from_str(yaml)
            .map_err(|e| EngineError::User(format!("invalid taint atom yaml: {}", e)))?;
        let mut config = Self::default_config();
        for atom in file.atoms {
            if let Some(category) = &atom.category {
                let bucket = match atom.kind {
                    AtomKind::Source => &mut config.sources,
                    AtomKind::Sink => &mut config.sinks,
                    AtomKind::Sanitizer => &mut config.sanitizers,
                };
                bucket
                    .entry(category.clone())
                    .or_default()
                    .extend(atom.names.iter().cloned());
            }
            config.atoms.insert(atom.id.clone(), atom);
        }
        Ok(config)
    }

    pub fn has_source_category(&self, category: &str) -> bool {
        self.sources.contains_key(category)
    }

    pub fn has_sink_category(&self, category: &str) -> bool {
        self.sinks.contains_key(category)
    }

    pub fn get_sources(&self, category: &str) -> &[String] {
        self.sources.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_sinks(&self, category: &str) -> &[String] {
        self.sinks.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_sanitizers(&self, category: &str) -> &[String] {
        self.sanitizers
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Names carried by a YAML atom id, if registered.
    pub fn atom_names(&self, atom_id: &str) -> Option<&[String]> {
        self.atoms.get(atom_id).map(|a| a.names.as_slice())
    }
}

fn str_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
