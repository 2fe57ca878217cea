//! Named post-effect attributes attached to nodes
//!
//! Text form: `name[key:value,key:value]`, entries separated by `;` or
//! whitespace. Colours are `#RRGGBB` or `#RRGGBBAA`.

use crate::error::{SceneError, SceneResult};
use crate::foundation::math::Color4;
use std::collections::BTreeMap;

/// Attribute key holding an override colour
pub const COLOR_ATTRIBUTE: &str = "color";

/// Attribute key overriding the X-ray outline fade exponent
pub const OUTLINE_FADING_ATTRIBUTE: &str = "outlineFadingFactor";

/// One named effect and its parameters
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EffectAttributes {
    name: String,
    properties: BTreeMap<String, String>,
}

impl EffectAttributes {
    /// Effect with no parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder: add a parameter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Effect name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw parameter value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Parameter parsed as a colour
    pub fn color(&self, key: &str) -> Option<Color4> {
        self.get(key).and_then(parse_color)
    }

    /// Parameter parsed as a float
    pub fn float(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Parse a list of effects
    pub fn parse_list(text: &str) -> SceneResult<Vec<Self>> {
        split_entries(text)?
            .into_iter()
            .map(Self::parse)
            .collect()
    }

    /// Parse a single `name[key:value,...]` entry
    pub fn parse(entry: &str) -> SceneResult<Self> {
        let invalid = || SceneError::InvalidEffectAttributes(entry.to_string());
        let entry = entry.trim();
        let (name, body) = match entry.find('[') {
            Some(open) => {
                let body = entry[open + 1..].strip_suffix(']').ok_or_else(invalid)?;
                (&entry[..open], Some(body))
            }
            None => (entry, None),
        };
        let name = name.trim();
        if name.is_empty()
            || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid());
        }

        let mut attributes = Self::new(name);
        for pair in body.into_iter().flat_map(|b| b.split(',')) {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once(':').ok_or_else(invalid)?;
            let key = key.trim();
            if key.is_empty() {
                return Err(invalid());
            }
            attributes.properties.insert(key.to_string(), value.trim().to_string());
        }
        Ok(attributes)
    }
}

/// Split at `;` or whitespace outside brackets
fn split_entries(text: &str) -> SceneResult<Vec<&str>> {
    let mut entries = Vec::new();
    let mut depth = 0_i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth < 0 {
                    return Err(SceneError::InvalidEffectAttributes(text.to_string()));
                }
            }
            c if depth == 0 && (c == ';' || c.is_whitespace()) => {
                if !text[start..i].trim().is_empty() {
                    entries.push(&text[start..i]);
                }
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(SceneError::InvalidEffectAttributes(text.to_string()));
    }
    if !text[start..].trim().is_empty() {
        entries.push(&text[start..]);
    }
    Ok(entries)
}

/// Parse `#RRGGBB` or `#RRGGBBAA`
pub fn parse_color(text: &str) -> Option<Color4> {
    let hex = text.trim().strip_prefix('#')?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .ok()
            .map(|v| f32::from(v) / 255.0)
    };
    let alpha = if hex.len() == 8 { channel(3)? } else { 1.0 };
    Some(Color4::new(channel(0)?, channel(1)?, channel(2)?, alpha))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_single_with_properties() {
        let effect = EffectAttributes::parse("xray[color:#FF0000, width: 2.5]").unwrap();
        assert_eq!(effect.name(), "xray");
        assert_relative_eq!(
            effect.color(COLOR_ATTRIBUTE).unwrap(),
            Color4::new(1.0, 0.0, 0.0, 1.0)
        );
        assert_relative_eq!(effect.float("width").unwrap(), 2.5);
        assert!(effect.get("missing").is_none());
    }

    #[test]
    fn test_parse_list_separators() {
        let effects =
            EffectAttributes::parse_list("outline; xray[color:#00FF0080]  border").unwrap();
        let names: Vec<&str> = effects.iter().map(EffectAttributes::name).collect();
        assert_eq!(names, vec!["outline", "xray", "border"]);
        assert_relative_eq!(effects[1].color("color").unwrap().w, 128.0 / 255.0);
        assert!(EffectAttributes::parse_list("  ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(EffectAttributes::parse_list("xray[color:#FF0000").is_err());
        assert!(EffectAttributes::parse_list("xray]").is_err());
        assert!(EffectAttributes::parse("[color:#FF0000]").is_err());
        assert!(EffectAttributes::parse("xray[color]").is_err());
        assert!(EffectAttributes::parse("x ray").is_err());
    }

    #[test]
    fn test_parse_color_forms() {
        assert!(parse_color("#12345").is_none());
        assert!(parse_color("123456").is_none());
        assert!(parse_color("#GG0000").is_none());
        assert_relative_eq!(parse_color("#0000FF").unwrap(), Color4::new(0.0, 0.0, 1.0, 1.0));
    }
}
