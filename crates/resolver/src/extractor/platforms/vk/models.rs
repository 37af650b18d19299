use crate::extractor::classifier::StreamTechnology;

/// One candidate location inside a VK `player` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerField {
    /// JSON pointer relative to the player node.
    pub pointer: &'static str,
    pub technology: StreamTechnology,
    pub quality: Option<u32>,
}

const fn manifest(pointer: &'static str, technology: StreamTechnology) -> PlayerField {
    PlayerField {
        pointer,
        technology,
        quality: None,
    }
}

const fn file(pointer: &'static str, quality: u32) -> PlayerField {
    PlayerField {
        pointer,
        technology: StreamTechnology::Progressive,
        quality: Some(quality),
    }
}

/// Fields read from each player node. Within a technology, earlier entries win.
pub const PLAYER_FIELDS: &[PlayerField] = &[
    manifest("/params/0/hls", StreamTechnology::Hls),
    manifest("/hls", StreamTechnology::Hls),
    manifest("/params/0/hls_ondemand", StreamTechnology::Hls),
    manifest("/dash_manifest", StreamTechnology::Dash),
    manifest("/params/0/dash", StreamTechnology::Dash),
    manifest("/params/0/dash_sep", StreamTechnology::Dash),
    manifest("/cache/data/dash", StreamTechnology::Dash),
    file("/params/0/url2160", 2160),
    file("/params/0/url1440", 1440),
    file("/params/0/url1080", 1080),
    file("/params/0/url720", 720),
    file("/params/0/url480", 480),
    file("/params/0/url360", 360),
    file("/params/0/url240", 240),
    file("/params/0/url144", 144),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::classifier::PROGRESSIVE_QUALITIES;

    #[test]
    fn progressive_fields_cover_every_quality() {
        let qualities = PLAYER_FIELDS
            .iter()
            .filter_map(|f| f.quality)
            .collect::<Vec<_>>();
        assert_eq!(qualities, PROGRESSIVE_QUALITIES);
    }

    #[test]
    fn table_is_grouped_by_technology() {
        let mut technologies = PLAYER_FIELDS.iter().map(|f| f.technology).collect::<Vec<_>>();
        let unsorted = technologies.clone();
        technologies.sort();
        assert_eq!(technologies, unsorted);
    }
}
