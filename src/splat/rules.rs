//! Declarative splat layer rules and their validation.

use serde::{Deserialize, Serialize};

/// Default half-width of every smooth-step transition band.
pub const DEFAULT_BLEND_DISTANCE: f32 = 0.05;

/// One of the four packed output channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    R,
    G,
    B,
    A,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::R, Channel::G, Channel::B, Channel::A];

    /// Parse a channel letter, case-insensitive.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'R' => Some(Self::R),
            'G' => Some(Self::G),
            'B' => Some(Self::B),
            'A' => Some(Self::A),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self {
            Self::R => 'R',
            Self::G => 'G',
            Self::B => 'B',
            Self::A => 'A',
        };
        write!(f, "{c}")
    }
}

/// Threshold gates; absent thresholds do not constrain the layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerRules {
    pub min_altitude: Option<f32>,
    pub max_altitude: Option<f32>,
    pub min_slope: Option<f32>,
    pub max_slope: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerDefinition {
    pub name: String,
    /// The base layer takes whatever weight the explicit layers leave over
    #[serde(default)]
    pub is_base: bool,
    /// Channel letter (R, G, B or A); required for explicit layers
    #[serde(default)]
    pub channel: Option<char>,
    #[serde(default)]
    pub rules: LayerRules,
}

impl LayerDefinition {
    pub fn base(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_base: true,
            channel: None,
            rules: LayerRules::default(),
        }
    }

    pub fn explicit(name: &str, channel: char, rules: LayerRules) -> Self {
        Self {
            name: name.to_string(),
            is_base: false,
            channel: Some(channel),
            rules,
        }
    }
}

/// Layers packed together into one RGBA image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputGroup {
    pub name: String,
    pub layers: Vec<LayerDefinition>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplatRules {
    pub blend_distance: f32,
    pub groups: Vec<OutputGroup>,
}

impl Default for SplatRules {
    fn default() -> Self {
        Self {
            blend_distance: DEFAULT_BLEND_DISTANCE,
            groups: Vec::new(),
        }
    }
}

/// A configuration problem found while resolving a group. None are fatal.
#[derive(Clone, Debug, PartialEq)]
pub enum SplatDiagnostic {
    /// Group has no base layer; the group is skipped
    MissingBaseLayer { group: String },
    /// Group has more than one base layer; the group is skipped
    MultipleBaseLayers { group: String },
    /// Explicit layer without a usable channel letter; the layer is skipped
    InvalidChannel { group: String, layer: String, channel: Option<char> },
    /// Channel already claimed by an earlier layer; the layer is skipped
    DuplicateChannel { group: String, layer: String, channel: Channel },
    /// All four channels are taken, so the base layer overwrites alpha
    BaseOnAlpha { group: String, layer: String },
}

impl SplatDiagnostic {
    /// Whether the whole group is dropped.
    pub fn skips_group(&self) -> bool {
        matches!(
            self,
            Self::MissingBaseLayer { .. } | Self::MultipleBaseLayers { .. }
        )
    }
}

impl std::fmt::Display for SplatDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingBaseLayer { group } => {
                write!(f, "splat group '{group}' has no base layer, skipping")
            }
            Self::MultipleBaseLayers { group } => {
                write!(f, "splat group '{group}' has more than one base layer, skipping")
            }
            Self::InvalidChannel { group, layer, channel } => match channel {
                Some(c) => write!(f, "layer '{layer}' in group '{group}' has invalid channel '{c}', skipping"),
                None => write!(f, "layer '{layer}' in group '{group}' has no channel, skipping"),
            },
            Self::DuplicateChannel { group, layer, channel } => write!(
                f,
                "layer '{layer}' in group '{group}' reuses channel {channel}, skipping"
            ),
            Self::BaseOnAlpha { group, layer } => write!(
                f,
                "splat group '{group}' has no free channel for base layer '{layer}', overwriting alpha"
            ),
        }
    }
}

/// A group after channel assignment, ready for classification.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedGroup {
    pub name: String,
    pub base_layer: String,
    pub base_channel: Channel,
    /// Explicit layers in declaration order with their claimed channel
    pub layers: Vec<(LayerDefinition, Channel)>,
    /// Every layer name declared in the group, including skipped ones
    pub declared_layers: Vec<String>,
}

impl OutputGroup {
    /// Assign channels: explicit layers claim theirs in declaration order,
    /// the base layer takes the first free one (alpha if none remain).
    pub fn resolve(&self) -> (Option<ResolvedGroup>, Vec<SplatDiagnostic>) {
        let mut diagnostics = Vec::new();

        let bases: Vec<&LayerDefinition> = self.layers.iter().filter(|l| l.is_base).collect();
        let base = match bases.as_slice() {
            [only] => *only,
            [] => {
                diagnostics.push(SplatDiagnostic::MissingBaseLayer { group: self.name.clone() });
                return (None, diagnostics);
            }
            _ => {
                diagnostics.push(SplatDiagnostic::MultipleBaseLayers { group: self.name.clone() });
                return (None, diagnostics);
            }
        };

        let mut used = [false; 4];
        let mut layers = Vec::new();
        for layer in self.layers.iter().filter(|l| !l.is_base) {
            let Some(channel) = layer.channel.and_then(Channel::from_char) else {
                diagnostics.push(SplatDiagnostic::InvalidChannel {
                    group: self.name.clone(),
                    layer: layer.name.clone(),
                    channel: layer.channel,
                });
                continue;
            };
            if used[channel.index()] {
                diagnostics.push(SplatDiagnostic::DuplicateChannel {
                    group: self.name.clone(),
                    layer: layer.name.clone(),
                    channel,
                });
                continue;
            }
            used[channel.index()] = true;
            layers.push((layer.clone(), channel));
        }

        let base_channel = match Channel::ALL.iter().find(|c| !used[c.index()]) {
            Some(&c) => c,
            None => {
                diagnostics.push(SplatDiagnostic::BaseOnAlpha {
                    group: self.name.clone(),
                    layer: base.name.clone(),
                });
                Channel::A
            }
        };

        let resolved = ResolvedGroup {
            name: self.name.clone(),
            base_layer: base.name.clone(),
            base_channel,
            layers,
            declared_layers: self.layers.iter().map(|l| l.name.clone()).collect(),
        };
        (Some(resolved), diagnostics)
    }
}

impl SplatRules {
    /// Grass on gentle slopes, rock on steep ones, dirt everywhere else.
    pub fn default_rules() -> Self {
        Self {
            blend_distance: DEFAULT_BLEND_DISTANCE,
            groups: vec![OutputGroup {
                name: "base".to_string(),
                layers: vec![
                    LayerDefinition::base("dirt"),
                    LayerDefinition::explicit(
                        "grass",
                        'R',
                        LayerRules {
                            max_slope: Some(0.35),
                            ..LayerRules::default()
                        },
                    ),
                    LayerDefinition::explicit(
                        "rock",
                        'G',
                        LayerRules {
                            min_slope: Some(0.5),
                            ..LayerRules::default()
                        },
                    ),
                ],
            }],
        }
    }

    /// The configured rules, or the default set when no group is declared.
    pub fn or_default(&self) -> std::borrow::Cow<'_, SplatRules> {
        if self.groups.is_empty() {
            std::borrow::Cow::Owned(Self::default_rules())
        } else {
            std::borrow::Cow::Borrowed(self)
        }
    }

    /// Collect every configuration problem without generating anything.
    pub fn validate(&self) -> Vec<SplatDiagnostic> {
        self.groups.iter().flat_map(|g| g.resolve().1).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(layers: Vec<LayerDefinition>) -> OutputGroup {
        OutputGroup {
            name: "g".to_string(),
            layers,
        }
    }

    #[test]
    fn test_default_rules_resolve_cleanly() {
        let rules = SplatRules::default_rules();
        assert!(rules.validate().is_empty());
        let (resolved, _) = rules.groups[0].resolve();
        let resolved = resolved.unwrap();
        assert_eq!(resolved.base_layer, "dirt");
        // R and G are claimed, so the base lands on B
        assert_eq!(resolved.base_channel, Channel::B);
    }

    #[test]
    fn test_missing_and_multiple_base_skip_group() {
        let (none, diags) = group(vec![LayerDefinition::explicit("a", 'R', LayerRules::default())]).resolve();
        assert!(none.is_none());
        assert!(diags[0].skips_group());

        let (none, diags) = group(vec![LayerDefinition::base("a"), LayerDefinition::base("b")]).resolve();
        assert!(none.is_none());
        assert_eq!(diags, vec![SplatDiagnostic::MultipleBaseLayers { group: "g".into() }]);
    }

    #[test]
    fn test_channels_are_exclusive() {
        let (resolved, diags) = group(vec![
            LayerDefinition::base("dirt"),
            LayerDefinition::explicit("a", 'r', LayerRules::default()),
            LayerDefinition::explicit("b", 'R', LayerRules::default()),
            LayerDefinition::explicit("c", 'x', LayerRules::default()),
        ])
        .resolve();
        let resolved = resolved.unwrap();
        assert_eq!(resolved.layers.len(), 1);
        assert_eq!(resolved.layers[0].1, Channel::R);
        assert_eq!(resolved.base_channel, Channel::G);
        assert_eq!(diags.len(), 2);
        assert!(matches!(diags[0], SplatDiagnostic::DuplicateChannel { channel: Channel::R, .. }));
        assert!(matches!(diags[1], SplatDiagnostic::InvalidChannel { channel: Some('x'), .. }));
        assert_eq!(resolved.declared_layers, vec!["dirt", "a", "b", "c"]);
    }

    #[test]
    fn test_full_group_pushes_base_to_alpha() {
        let (resolved, diags) = group(vec![
            LayerDefinition::base("dirt"),
            LayerDefinition::explicit("r", 'R', LayerRules::default()),
            LayerDefinition::explicit("g", 'G', LayerRules::default()),
            LayerDefinition::explicit("b", 'B', LayerRules::default()),
            LayerDefinition::explicit("a", 'A', LayerRules::default()),
        ])
        .resolve();
        assert_eq!(resolved.unwrap().base_channel, Channel::A);
        assert!(matches!(diags[0], SplatDiagnostic::BaseOnAlpha { .. }));
    }

    #[test]
    fn test_rules_from_json() {
        let rules: SplatRules = serde_json::from_str(
            r#"{
                "groups": [{
                    "name": "cliffs",
                    "layers": [
                        {"name": "sand", "is_base": true},
                        {"name": "snow", "channel": "B", "rules": {"min_altitude": 0.8}}
                    ]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(rules.blend_distance, DEFAULT_BLEND_DISTANCE);
        assert_eq!(rules.groups[0].layers[1].rules.min_altitude, Some(0.8));
        assert_eq!(rules.groups[0].layers[1].channel, Some('B'));
        assert!(rules.validate().is_empty());
    }

    #[test]
    fn test_empty_rules_fall_back_to_default() {
        let rules = SplatRules::default();
        assert_eq!(rules.or_default().groups.len(), 1);
    }
}
