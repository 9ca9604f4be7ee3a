use std::fmt::Write;

/// What a stand-in namespace hands out for any symbol looked up on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// A rounded square labeled with the first two characters of the
    /// symbol.
    Icon,
    /// A dashed panel labeled with the symbol name.
    Chart,
}

impl Placeholder {
    /// Name of the component factory defined by the document template.
    fn factory(self) -> &'static str {
        match self {
            Placeholder::Icon => "__devsquadIconPlaceholder",
            Placeholder::Chart => "__devsquadChartPlaceholder",
        }
    }
}

/// A module the preview document provides as a global namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShimLibrary {
    /// The module specifier as written in an import statement.
    pub specifier: &'static str,
    /// The global the module's exports are read from.
    pub global: &'static str,
    /// Set for libraries the document does not load for real.
    pub placeholder: Option<Placeholder>,
}

/// Libraries that imports are resolved against.
pub static SHIM_LIBRARIES: [ShimLibrary; 5] = [
    ShimLibrary {
        specifier: "react",
        global: "React",
        placeholder: None,
    },
    ShimLibrary {
        specifier: "react-dom",
        global: "ReactDOM",
        placeholder: None,
    },
    ShimLibrary {
        specifier: "react-dom/client",
        global: "ReactDOM",
        placeholder: None,
    },
    ShimLibrary {
        specifier: "lucide-react",
        global: "LucideReact",
        placeholder: Some(Placeholder::Icon),
    },
    ShimLibrary {
        specifier: "recharts",
        global: "Recharts",
        placeholder: Some(Placeholder::Chart),
    },
];

/// Looks up the library imported as `specifier`.
pub fn find_shim(specifier: &str) -> Option<&'static ShimLibrary> {
    SHIM_LIBRARIES.iter().find(|lib| lib.specifier == specifier)
}

/// Generates the script that installs a stand-in namespace for every
/// library with a placeholder.
pub(crate) fn shim_script() -> String {
    let mut script = String::new();
    let mut installed: Vec<&str> = vec![];
    for lib in &SHIM_LIBRARIES {
        let Some(placeholder) = lib.placeholder else {
            continue;
        };
        if installed.contains(&lib.global) {
            continue;
        }
        installed.push(lib.global);
        // Writing into a `String` never fails.
        let _ = writeln!(
            script,
            "        window.{global} = window.{global} || \
             __devsquadShimNamespace({factory});",
            global = lib.global,
            factory = placeholder.factory(),
        );
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_shim() {
        assert_eq!(
            find_shim("react-dom/client").map(|l| l.global),
            Some("ReactDOM")
        );
        assert_eq!(
            find_shim("lucide-react").and_then(|l| l.placeholder),
            Some(Placeholder::Icon)
        );
        assert!(find_shim("framer-motion").is_none());
    }

    #[test]
    fn test_shim_script() {
        let script = shim_script();
        assert!(script.contains(
            "window.LucideReact = window.LucideReact || \
             __devsquadShimNamespace(__devsquadIconPlaceholder);"
        ));
        assert!(script.contains(
            "__devsquadShimNamespace(__devsquadChartPlaceholder);"
        ));
        assert!(!script.contains("window.React ="));
        assert_eq!(script.lines().count(), 2);
    }
}
