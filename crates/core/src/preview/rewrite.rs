//! Turns module-style component source into a classic script.
//!
//! The preview document has no module loader, so import statements are
//! resolved against the globals described by [`SHIM_LIBRARIES`] and export
//! syntax is dropped. Every step is a textual rewrite that leaves the source
//! alone when it finds nothing to rewrite.
//!
//! [`SHIM_LIBRARIES`]: super::SHIM_LIBRARIES

use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::shim::find_shim;

macro_rules! cached_regex {
    ($(fn $name:ident() = $pattern:expr;)+) => {
        $(
            fn $name() -> &'static Regex {
                static REGEX: OnceLock<Regex> = OnceLock::new();
                REGEX.get_or_init(|| {
                    Regex::new($pattern).expect(concat!(
                        "Failed to compile ",
                        stringify!($name)
                    ))
                })
            }
        )+
    };
}

cached_regex! {
    fn import_regex() = r#"(?m)^[ \t]*import\s+(?:(?P<clause>[^'";]*?)\s*from\s*)?['"](?P<spec>[^'"\n]+)['"][ \t]*;?"#;
    fn default_decl_regex() = r"(?m)^(?P<indent>[ \t]*)export\s+default\s+(?P<decl>(?:async\s+)?function\s*\*?\s*(?P<fname>[A-Za-z_$][\w$]*)|class\s+(?P<cname>[A-Za-z_$][\w$]*))";
    fn default_ident_regex() = r"(?m)^(?P<indent>[ \t]*)export\s+default\s+(?P<name>[A-Za-z_$][\w$]*)[ \t]*;?[ \t]*$";
    fn default_expr_regex() = r"(?m)^(?P<indent>[ \t]*)export\s+default\s+";
    fn named_export_regex() = r"(?m)^(?P<indent>[ \t]*)export\s+(?P<kw>const|let|var|function|async|class)\b";
    fn export_list_regex() = r#"(?m)^(?P<indent>[ \t]*)export\s*(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})(?:\s*from\s*['"][^'"\n]*['"])?[ \t]*;?"#;
    fn app_decl_regex() = r"(?m)^[ \t]*(?:(?:const|let|var)\s+App\b|(?:async\s+)?function\s+App\b|class\s+App\b)";
    fn mount_regex() = r"createRoot\s*\(|hydrateRoot\s*\(|ReactDOM\.render\s*\(";
    fn script_close_regex() = r"(?i)</script";
}

/// The component mounted when the source names its root implicitly.
const CONVENTIONAL_ROOT: &str = "App";

/// The binding given to an anonymous default export.
const ANONYMOUS_ROOT: &str = "_App";

/// Delay before mounting a root component that the source never mounts.
const DEFERRED_MOUNT_MS: u32 = 100;

/// Keywords that can follow `export default` without being a binding.
const RESERVED: [&str; 3] = ["function", "class", "async"];

fn mount_statement(root: &str) -> String {
    format!(
        "ReactDOM.createRoot(document.getElementById(\"root\"))\
         .render(React.createElement({root}));"
    )
}

/// Rewrites component source so it runs without a module system.
pub fn transpile_component_source(source: &str) -> String {
    let mut code = import_regex()
        .replace_all(source, rewrite_import)
        .into_owned();
    let mut mounted = mount_regex().is_match(&code);
    let mut root = None;

    if let Some(caps) = default_decl_regex().captures(&code) {
        let name = caps
            .name("fname")
            .or_else(|| caps.name("cname"))
            .map_or("", |m| m.as_str());
        if name != "extends" {
            root = Some(name.to_owned());
            let range = caps.get(0).map_or(0..0, |m| m.range());
            let replacement = format!("{}{}", &caps["indent"], &caps["decl"]);
            code.replace_range(range, &replacement);
        }
    }

    if root.is_none() {
        let bare = default_ident_regex()
            .captures(&code)
            .filter(|caps| !RESERVED.contains(&&caps["name"]))
            .map(|caps| {
                let range = caps.get(0).map_or(0..0, |m| m.range());
                (range, caps["indent"].to_owned(), caps["name"].to_owned())
            });
        if let Some((range, indent, name)) = bare {
            let replacement = if mounted {
                format!("{indent}// export default {name}")
            } else {
                format!("{indent}{}", mount_statement(&name))
            };
            code.replace_range(range, &replacement);
            mounted = true;
        }
    }

    if root.is_none() {
        if let Some(caps) = default_expr_regex().captures(&code) {
            let range = caps.get(0).map_or(0..0, |m| m.range());
            let replacement =
                format!("{}const {ANONYMOUS_ROOT} = ", &caps["indent"]);
            code.replace_range(range, &replacement);
            root = Some(ANONYMOUS_ROOT.to_owned());
        }
    }

    code = named_export_regex()
        .replace_all(&code, "${indent}${kw}")
        .into_owned();
    code = export_list_regex()
        .replace_all(&code, "${indent}// export list removed")
        .into_owned();

    if root.is_none() && app_decl_regex().is_match(&code) {
        root = Some(CONVENTIONAL_ROOT.to_owned());
    }
    if let Some(root) = root.filter(|_| !mounted) {
        trace!("deferring the mount of `{root}`");
        code.push_str(&format!(
            "\nsetTimeout(() => {{ if (typeof {root} !== \"undefined\") \
             {mount} }}, {DEFERRED_MOUNT_MS});",
            mount = mount_statement(&root),
        ));
    }

    script_close_regex()
        .replace_all(&code, |caps: &Captures<'_>| {
            format!("<\\/{}", &caps[0][2..])
        })
        .into_owned()
}

fn rewrite_import(caps: &Captures<'_>) -> String {
    let specifier = &caps["spec"];
    let clause = caps.name("clause").map_or("", |m| m.as_str().trim());
    let statement = find_shim(specifier)
        .filter(|_| !clause.is_empty() && !clause.starts_with("type "))
        .and_then(|lib| bind_from_global(clause, lib.global));
    match statement {
        Some(statement) => statement,
        None => format!("// import from \"{specifier}\" removed"),
    }
}

/// Builds the declarations for an import clause such as
/// `React, { useState as useLocal }` reading from `window.<global>`.
fn bind_from_global(clause: &str, global: &str) -> Option<String> {
    let (head, named) = match (clause.find('{'), clause.rfind('}')) {
        (Some(open), Some(close)) if open < close => {
            (&clause[..open], Some(&clause[open + 1..close]))
        }
        _ => (clause, None),
    };

    let mut statements = vec![];
    for item in head.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let local = match item.strip_prefix('*') {
            Some(rest) => rest.trim_start().strip_prefix("as")?.trim(),
            None => item,
        };
        statements.push(format!("const {local} = window.{global};"));
    }

    let bindings = named
        .into_iter()
        .flat_map(|named| named.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with("type "))
        .map(|item| match item.split_once(" as ") {
            Some((imported, local)) => {
                format!("{}: {}", imported.trim(), local.trim())
            }
            None => item.to_owned(),
        })
        .collect::<Vec<_>>();
    if !bindings.is_empty() {
        statements.push(format!(
            "const {{ {} }} = window.{global};",
            bindings.join(", ")
        ));
    }

    if statements.is_empty() {
        None
    } else {
        Some(statements.join(" "))
    }
}
