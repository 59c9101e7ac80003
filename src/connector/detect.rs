//! Manifest Classification
//!
//! Pure, side-effect-free inference of project shape from an already-parsed
//! manifest. Connectors fetch the bytes; everything here is string matching
//! over the parsed value so the heuristics stay testable in isolation.

use serde_json::Value;

use crate::types::PackageManager;

/// Priority-ordered framework rules: the first dependency hit wins.
const FRAMEWORK_RULES: &[(&str, &str)] = &[
    ("next", "Next.js"),
    ("nuxt", "Nuxt"),
    ("@angular/core", "Angular"),
    ("svelte", "Svelte"),
    ("vue", "Vue"),
    ("react", "React"),
    ("@nestjs/core", "NestJS"),
    ("fastify", "Fastify"),
    ("express", "Express"),
];

/// Lockfile names mapped to their package manager.
const LOCKFILE_RULES: &[(&str, PackageManager)] = &[
    ("pnpm-lock.yaml", PackageManager::Pnpm),
    ("yarn.lock", PackageManager::Yarn),
    ("bun.lockb", PackageManager::Bun),
    ("bun.lock", PackageManager::Bun),
    ("package-lock.json", PackageManager::Npm),
];

/// Classify the framework from a parsed `package.json`.
///
/// Best-effort: checks `dependencies` then `devDependencies` against the
/// priority list. Returns `None` when nothing matches - absence of a
/// framework is not an error.
pub fn detect_framework(manifest: &Value) -> Option<String> {
    for (dep, framework) in FRAMEWORK_RULES {
        if has_dependency(manifest, dep) {
            return Some((*framework).to_string());
        }
    }
    None
}

fn has_dependency(manifest: &Value, name: &str) -> bool {
    ["dependencies", "devDependencies"]
        .iter()
        .any(|section| {
            manifest
                .get(section)
                .and_then(|deps| deps.get(name))
                .is_some()
        })
}

/// Detect the package manager from root-level file names.
pub fn detect_package_manager<S: AsRef<str>>(root_files: &[S]) -> Option<PackageManager> {
    for (lockfile, manager) in LOCKFILE_RULES {
        if root_files.iter().any(|f| f.as_ref() == *lockfile) {
            return Some(*manager);
        }
    }
    None
}

/// Conventional entry points named by the manifest (`main`, `module`, `bin`).
pub fn manifest_entry_points(manifest: &Value) -> Vec<String> {
    let mut entries = Vec::new();

    for field in ["main", "module"] {
        if let Some(value) = manifest.get(field).and_then(|v| v.as_str()) {
            entries.push(value.to_string());
        }
    }

    match manifest.get("bin") {
        Some(Value::String(path)) => entries.push(path.clone()),
        Some(Value::Object(bins)) => {
            entries.extend(bins.values().filter_map(|v| v.as_str().map(String::from)));
        }
        _ => {}
    }

    entries.dedup();
    entries
}

/// Environment files recognized at the project root.
pub fn is_env_file(name: &str) -> bool {
    name == ".env" || name.starts_with(".env.")
}
