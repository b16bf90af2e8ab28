//! Plugins shipped with the crate, referenced by name in `plugins:`.

use crate::generate::{Declaration, Target, UtilityDef, ValueKind};

use super::{Plugin, PluginKind};

/// Names accepted in the `plugins` list.
pub const BUNDLED_PLUGINS: &[&str] = &["aspect-ratio", "line-clamp"];

/// Look up a bundled plugin by name.
pub fn bundled(name: &str) -> Option<Plugin> {
    let kind = match name {
        "aspect-ratio" => aspect_ratio(),
        "line-clamp" => line_clamp(),
        _ => return None,
    };
    Some(Plugin {
        name: name.to_string(),
        kind,
    })
}

/// `aspect-square`, `aspect-video`, `aspect-[4/3]`, and theme `aspectRatio` keys.
fn aspect_ratio() -> PluginKind {
    let mut target = Target::new(&["aspectRatio"], &["aspect-ratio"], ValueKind::Any);
    target.values = [("auto", "auto"), ("square", "1 / 1"), ("video", "16 / 9")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    PluginKind::Grammar(vec![UtilityDef::new("aspect", target)])
}

/// `line-clamp-3` truncates text to three lines with an ellipsis.
fn line_clamp() -> PluginKind {
    let mut target = Target::new(&["lineClamp"], &["-webkit-line-clamp"], ValueKind::Number);
    target.values = (1..=6)
        .map(|n| (n.to_string(), n.to_string()))
        .chain([("none".to_string(), "none".to_string())])
        .collect();
    target.extra = vec![
        Declaration::new("overflow", "hidden"),
        Declaration::new("display", "-webkit-box"),
        Declaration::new("-webkit-box-orient", "vertical"),
    ];

    PluginKind::Grammar(vec![UtilityDef::new("line-clamp", target)])
}
