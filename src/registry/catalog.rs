//! Built-in registry mirror table and name lookup.

use crate::config::settings::CustomRegistry;

/// The npm default registry, used by reset-to-official.
pub const OFFICIAL_REGISTRY_URL: &str = "https://registry.npmjs.org/";

/// Fixed mirror table. Never persisted and never user-editable.
pub const BUILTIN_REGISTRIES: &[(&str, &str)] = &[
    ("Taobao (npmmirror)", "https://registry.npmmirror.com/"),
    ("Tencent", "https://mirrors.cloud.tencent.com/npm/"),
    ("Huawei", "https://mirrors.huaweicloud.com/repository/npm/"),
    ("Netease", "https://mirrors.163.com/npm/"),
    ("USTC", "https://npmreg.proxy.ustclug.org/"),
    ("Official (npmjs)", OFFICIAL_REGISTRY_URL),
];

/// Label for a URL that matches neither the built-ins nor the customs.
pub const UNKNOWN_REGISTRY_LABEL: &str = "Custom";

pub fn is_builtin_name(name: &str) -> bool {
    BUILTIN_REGISTRIES.iter().any(|(n, _)| *n == name)
}

pub fn is_builtin_url(url: &str) -> bool {
    BUILTIN_REGISTRIES.iter().any(|(_, u)| *u == url)
}

/// Human-readable name for a registry URL.
///
/// First built-in match wins, then the first custom match, else the
/// "Custom" sentinel. Linear scan; the set stays small.
pub fn name_for(url: &str, customs: &[CustomRegistry]) -> String {
    if let Some((name, _)) = BUILTIN_REGISTRIES.iter().find(|(_, u)| *u == url) {
        return (*name).to_string();
    }
    if let Some(custom) = customs.iter().find(|c| c.url == url) {
        return custom.name.clone();
    }
    UNKNOWN_REGISTRY_LABEL.to_string()
}

/// All registries in display order: built-ins first, then customs.
pub fn all_registries(customs: &[CustomRegistry]) -> Vec<(String, String)> {
    let mut all: Vec<(String, String)> = BUILTIN_REGISTRIES
        .iter()
        .map(|(n, u)| ((*n).to_string(), (*u).to_string()))
        .collect();
    all.extend(customs.iter().map(|c| (c.name.clone(), c.url.clone())));
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert!(is_builtin_url("https://registry.npmmirror.com/"));
        assert!(is_builtin_name("Official (npmjs)"));
        assert!(!is_builtin_url("https://npm.corp.example/"));
        assert_eq!(
            name_for("https://registry.npmjs.org/", &[]),
            "Official (npmjs)"
        );
    }

    #[test]
    fn test_name_for_prefers_builtin_then_custom() {
        let customs = vec![CustomRegistry {
            name: "corp".into(),
            url: "https://npm.corp.example/".into(),
        }];
        assert_eq!(name_for("https://npm.corp.example/", &customs), "corp");
        assert_eq!(
            name_for("https://unknown.example/", &customs),
            UNKNOWN_REGISTRY_LABEL
        );
    }

    #[test]
    fn test_all_registries_order() {
        let customs = vec![CustomRegistry {
            name: "corp".into(),
            url: "https://npm.corp.example/".into(),
        }];
        let all = all_registries(&customs);
        assert_eq!(all.len(), BUILTIN_REGISTRIES.len() + 1);
        assert_eq!(all[0].0, BUILTIN_REGISTRIES[0].0);
        assert_eq!(all.last().unwrap().0, "corp");
    }
}
