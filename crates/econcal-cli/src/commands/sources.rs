//! Source listing.

use econcal_sources::{DEFAULT_SOURCE, SourceContext, SourceRegistry};

use crate::error::SyncResult;

/// Print the registered source names, marking the default.
pub fn list() -> SyncResult<()> {
    for line in lines(&SourceRegistry::builtin(SourceContext::default())) {
        println!("{}", line);
    }
    Ok(())
}

fn lines(registry: &SourceRegistry) -> Vec<String> {
    registry
        .names()
        .into_iter()
        .map(|name| {
            if name == DEFAULT_SOURCE {
                format!("{} (default)", name)
            } else {
                name.to_string()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_default_source() {
        let registry = SourceRegistry::builtin(SourceContext::default());
        assert_eq!(lines(&registry), vec!["fmp", "forexfactory (default)"]);
    }
}
