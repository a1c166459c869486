//! Closed catalog of the benchmark configuration columns eligible for
//! dynamic grouping and filtering. Only `Dimension::key()` may ever be
//! interpolated into generated SQL; values are always bound parameters.

use rusqlite::types::Value as SqlValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    NGpuLayers,
    SplitMode,
    MainGpu,
    NBatch,
    NUbatch,
    NCtx,
    NPrompt,
    NGen,
    NDepth,
    FlashAttn,
    CacheTypeK,
    CacheTypeV,
    Embeddings,
    NThreads,
    Backend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    Numeric,
    Text,
    Boolean,
}

/// Every dimension, in ascending priority order.
pub const ALL: [Dimension; 15] = [
    Dimension::NGpuLayers,
    Dimension::SplitMode,
    Dimension::MainGpu,
    Dimension::NBatch,
    Dimension::NUbatch,
    Dimension::NCtx,
    Dimension::NPrompt,
    Dimension::NGen,
    Dimension::NDepth,
    Dimension::FlashAttn,
    Dimension::CacheTypeK,
    Dimension::CacheTypeV,
    Dimension::Embeddings,
    Dimension::NThreads,
    Dimension::Backend,
];

impl Dimension {
    /// Column name in the benchmarks table.
    pub fn key(self) -> &'static str {
        match self {
            Self::NGpuLayers => "n_gpu_layers",
            Self::SplitMode => "split_mode",
            Self::MainGpu => "main_gpu",
            Self::NBatch => "n_batch",
            Self::NUbatch => "n_ubatch",
            Self::NCtx => "n_ctx",
            Self::NPrompt => "n_prompt",
            Self::NGen => "n_gen",
            Self::NDepth => "n_depth",
            Self::FlashAttn => "flash_attn",
            Self::CacheTypeK => "cache_type_k",
            Self::CacheTypeV => "cache_type_v",
            Self::Embeddings => "embeddings",
            Self::NThreads => "n_threads",
            Self::Backend => "backend",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NGpuLayers => "GPU Layers",
            Self::SplitMode => "Split Mode",
            Self::MainGpu => "Main GPU",
            Self::NBatch => "Batch Size",
            Self::NUbatch => "Micro-batch Size",
            Self::NCtx => "Context Size",
            Self::NPrompt => "Prompt Tokens",
            Self::NGen => "Generated Tokens",
            Self::NDepth => "Context Depth",
            Self::FlashAttn => "Flash Attention",
            Self::CacheTypeK => "K Cache Type",
            Self::CacheTypeV => "V Cache Type",
            Self::Embeddings => "Embeddings",
            Self::NThreads => "Threads",
            Self::Backend => "Backend",
        }
    }

    pub fn group(self) -> &'static str {
        match self {
            Self::NGpuLayers | Self::SplitMode | Self::MainGpu => "GPU",
            Self::NBatch | Self::NUbatch => "Batching",
            Self::NCtx | Self::NPrompt | Self::NGen | Self::NDepth => "Workload",
            Self::FlashAttn | Self::CacheTypeK | Self::CacheTypeV | Self::Embeddings => {
                "Attention & Cache"
            }
            Self::NThreads | Self::Backend => "System",
        }
    }

    pub fn kind(self) -> DimensionKind {
        match self {
            Self::NGpuLayers
            | Self::MainGpu
            | Self::NBatch
            | Self::NUbatch
            | Self::NCtx
            | Self::NPrompt
            | Self::NGen
            | Self::NDepth
            | Self::NThreads => DimensionKind::Numeric,
            Self::SplitMode | Self::CacheTypeK | Self::CacheTypeV | Self::Backend => {
                DimensionKind::Text
            }
            Self::FlashAttn | Self::Embeddings => DimensionKind::Boolean,
        }
    }

    pub fn priority(self) -> u32 {
        match self {
            Self::NGpuLayers => 1,
            Self::SplitMode => 2,
            Self::MainGpu => 3,
            Self::NBatch => 4,
            Self::NUbatch => 5,
            Self::NCtx => 6,
            Self::NPrompt => 7,
            Self::NGen => 8,
            Self::NDepth => 9,
            Self::FlashAttn => 10,
            Self::CacheTypeK => 11,
            Self::CacheTypeV => 12,
            Self::Embeddings => 13,
            Self::NThreads => 14,
            Self::Backend => 15,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        ALL.into_iter().find(|dimension| dimension.key() == key)
    }

    pub fn is_valid(key: &str) -> bool {
        Self::from_key(key).is_some()
    }

    /// Coerce a raw filter string into a typed bound parameter, so numeric
    /// and boolean columns are compared with their own affinity.
    pub fn bind_value(self, raw: &str) -> SqlValue {
        match self.kind() {
            DimensionKind::Numeric => match raw.parse::<i64>() {
                Ok(number) => SqlValue::Integer(number),
                Err(_) => SqlValue::Text(raw.to_string()),
            },
            DimensionKind::Boolean => match raw {
                "1" | "true" | "on" => SqlValue::Integer(1),
                "0" | "false" | "off" => SqlValue::Integer(0),
                other => SqlValue::Text(other.to_string()),
            },
            DimensionKind::Text => SqlValue::Text(raw.to_string()),
        }
    }
}

/// Keep only allow-listed keys, preserving input order. Unknown keys are
/// dropped silently; callers that want visibility warn at their boundary.
pub fn filter_valid<S: AsRef<str>>(keys: &[S]) -> Vec<Dimension> {
    keys.iter()
        .filter_map(|key| Dimension::from_key(key.as_ref()))
        .collect()
}

/// Dimensions bucketed by UI group, priority-ordered within and across
/// groups.
pub fn by_group() -> Vec<(&'static str, Vec<Dimension>)> {
    let mut groups: Vec<(&'static str, Vec<Dimension>)> = Vec::new();

    for dimension in ALL {
        match groups.iter_mut().find(|(name, _)| *name == dimension.group()) {
            Some((_, members)) => members.push(dimension),
            None => groups.push((dimension.group(), vec![dimension])),
        }
    }

    for (_, members) in &mut groups {
        members.sort_by_key(|dimension| dimension.priority());
    }
    groups.sort_by_key(|(_, members)| members[0].priority());

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_valid_preserves_order_and_drops_unknowns() {
        let kept = filter_valid(&["n_batch", "not_a_real_column", "backend"]);
        assert_eq!(kept, vec![Dimension::NBatch, Dimension::Backend]);
    }

    #[test]
    fn from_key_round_trips_every_dimension() {
        for dimension in ALL {
            assert_eq!(Dimension::from_key(dimension.key()), Some(dimension));
        }
        assert_eq!(Dimension::from_key("model_filename"), None);
        assert!(!Dimension::is_valid("id"));
    }

    #[test]
    fn by_group_orders_by_priority_within_and_across_groups() {
        let groups = by_group();
        assert_eq!(groups.len(), 5);
        assert_eq!(groups[0].0, "GPU");
        assert_eq!(groups[0].1, vec![
            Dimension::NGpuLayers,
            Dimension::SplitMode,
            Dimension::MainGpu
        ]);

        let mut last_priority = 0;
        for (_, members) in &groups {
            for dimension in members {
                assert!(dimension.priority() > last_priority);
                last_priority = dimension.priority();
            }
        }
    }

    #[test]
    fn bind_value_coerces_by_kind() {
        assert_eq!(
            Dimension::NBatch.bind_value("512"),
            SqlValue::Integer(512)
        );
        assert_eq!(
            Dimension::FlashAttn.bind_value("true"),
            SqlValue::Integer(1)
        );
        assert_eq!(
            Dimension::CacheTypeK.bind_value("q8_0"),
            SqlValue::Text("q8_0".to_string())
        );
    }
}
