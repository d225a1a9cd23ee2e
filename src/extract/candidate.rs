//! Per-entry image candidate selection.
//!
//! An entry yields at most one candidate URL. Entries with a preview set
//! are resolved through the variant selection policy; whenever that comes
//! up empty, including when there is no preview at all, the raw URL is
//! used verbatim if it points at the direct image host.

use html_escape::decode_html_entities;
use serde::{Deserialize, Serialize};

use crate::listing::{Entry, Preview, PreviewVariant};

/// Default floor for the smaller image dimension. Variants must strictly
/// exceed it on both axes to qualify.
pub const DEFAULT_RESOLUTION_FLOOR: u32 = 512;

/// Raw entry URLs are only used verbatim when they point here.
const DIRECT_IMAGE_PREFIX: &str = "https://i.redd.it/";
const DIRECT_IMAGE_SUFFIX: &str = ".jpg";

/// A resolved image URL with the entry metadata the index records for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCandidate {
    /// The URL to fetch.
    pub url: String,
    /// Entry title.
    pub title: String,
    /// Entry creation time, seconds since the epoch.
    pub created_utc: i64,
    /// Entry permalink.
    pub permalink: String,
}

/// Resolves `entry` to a candidate under the selection policy.
///
/// Non-indexable entries are skipped outright. With a preview set, the
/// qualifying variant with the smallest minimum dimension is chosen and its
/// URL is HTML-entity-decoded; a variant qualifies when
/// `min(width, height)` strictly exceeds `floor`. When no variant is
/// chosen, whether the preview yielded nothing or was absent, the raw URL
/// is used verbatim if it is a direct image link.
#[must_use]
pub fn select_candidate(entry: &Entry, floor: u32) -> Option<ImageCandidate> {
    if !entry.indexable {
        return None;
    }

    let url = match entry
        .preview
        .as_ref()
        .and_then(|preview| select_preview_variant(preview, floor))
    {
        Some(variant) => decode_html_entities(&variant.url).into_owned(),
        None => direct_image_url(&entry.url)?.to_string(),
    };

    Some(ImageCandidate {
        url,
        title: entry.title.clone(),
        created_utc: entry.created_utc,
        permalink: entry.permalink.clone(),
    })
}

/// Picks the qualifying variant with the smallest minimum dimension.
///
/// Variants are considered in listing order, explicit resolutions before
/// the source variant, so ties keep the first one seen. Preview images
/// without a resolutions list contribute no variants at all.
fn select_preview_variant(preview: &Preview, floor: u32) -> Option<&PreviewVariant> {
    let mut best: Option<&PreviewVariant> = None;
    for image in &preview.images {
        let Some(resolutions) = &image.resolutions else {
            continue;
        };
        for variant in resolutions.iter().chain(image.source.as_ref()) {
            if min_edge(variant) <= floor {
                continue;
            }
            if best.is_none_or(|b| min_edge(variant) < min_edge(b)) {
                best = Some(variant);
            }
        }
    }
    best
}

fn min_edge(variant: &PreviewVariant) -> u32 {
    variant.width.min(variant.height)
}

fn direct_image_url(url: &str) -> Option<&str> {
    (url.starts_with(DIRECT_IMAGE_PREFIX) && url.ends_with(DIRECT_IMAGE_SUFFIX)).then_some(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::listing::PreviewImage;

    fn entry(url: &str, preview: Option<Preview>) -> Entry {
        Entry {
            title: "a very good dog".to_string(),
            url: url.to_string(),
            indexable: true,
            created_utc: 1_700_000_000,
            permalink: "/r/corgi/comments/abc/a_very_good_dog/".to_string(),
            preview,
        }
    }

    fn variant(url: &str, width: u32, height: u32) -> PreviewVariant {
        PreviewVariant {
            url: url.to_string(),
            width,
            height,
        }
    }

    fn preview_of(resolutions: Vec<PreviewVariant>) -> Preview {
        Preview {
            images: vec![PreviewImage {
                source: None,
                resolutions: Some(resolutions),
            }],
        }
    }

    // ==================== Variant Selection Tests ====================

    #[test]
    fn test_smallest_qualifying_variant_wins() {
        let preview = preview_of(vec![
            variant("https://p.example/400.jpg", 400, 400),
            variant("https://p.example/900.jpg", 900, 900),
            variant("https://p.example/600.jpg", 600, 600),
        ]);
        let candidate = select_candidate(&entry("", Some(preview)), 512).unwrap();
        assert_eq!(candidate.url, "https://p.example/600.jpg");
    }

    #[test]
    fn test_floor_comparison_is_strict() {
        // Exactly 512 on the smaller edge does not qualify.
        let preview = preview_of(vec![
            variant("https://p.example/512.jpg", 512, 1024),
            variant("https://p.example/513.jpg", 513, 1024),
        ]);
        let candidate = select_candidate(&entry("", Some(preview)), 512).unwrap();
        assert_eq!(candidate.url, "https://p.example/513.jpg");
    }

    #[test]
    fn test_smaller_edge_governs_qualification() {
        // 2000x500: the smaller edge is under the floor, so it loses to a
        // square variant that clears it on both axes.
        let preview = preview_of(vec![
            variant("https://p.example/wide.jpg", 2000, 500),
            variant("https://p.example/square.jpg", 700, 700),
        ]);
        let candidate = select_candidate(&entry("", Some(preview)), 512).unwrap();
        assert_eq!(candidate.url, "https://p.example/square.jpg");
    }

    #[test]
    fn test_tie_keeps_first_seen_variant() {
        let preview = preview_of(vec![
            variant("https://p.example/first.jpg", 600, 800),
            variant("https://p.example/second.jpg", 800, 600),
        ]);
        let candidate = select_candidate(&entry("", Some(preview)), 512).unwrap();
        assert_eq!(candidate.url, "https://p.example/first.jpg");
    }

    #[test]
    fn test_source_variant_participates_after_resolutions() {
        let preview = Preview {
            images: vec![PreviewImage {
                source: Some(variant("https://p.example/source.jpg", 3000, 2000)),
                resolutions: Some(vec![variant("https://p.example/small.jpg", 320, 240)]),
            }],
        };
        let candidate = select_candidate(&entry("", Some(preview)), 512).unwrap();
        assert_eq!(candidate.url, "https://p.example/source.jpg");
    }

    #[test]
    fn test_image_without_resolutions_list_is_skipped() {
        // A source variant alone does not make the image eligible.
        let preview = Preview {
            images: vec![PreviewImage {
                source: Some(variant("https://p.example/source.jpg", 3000, 2000)),
                resolutions: None,
            }],
        };
        assert!(select_candidate(&entry("", Some(preview)), 512).is_none());
    }

    #[test]
    fn test_variant_url_entities_are_decoded() {
        let preview = preview_of(vec![variant(
            "https://preview.example/abc.jpg?width=640&amp;s=deadbeef",
            640,
            640,
        )]);
        let candidate = select_candidate(&entry("", Some(preview)), 512).unwrap();
        assert_eq!(
            candidate.url,
            "https://preview.example/abc.jpg?width=640&s=deadbeef"
        );
    }

    // ==================== Raw URL Fallback Tests ====================

    #[test]
    fn test_direct_image_url_used_verbatim() {
        let candidate = select_candidate(&entry("https://i.redd.it/abc.jpg", None), 512).unwrap();
        assert_eq!(candidate.url, "https://i.redd.it/abc.jpg");
    }

    #[test]
    fn test_unqualifying_preview_falls_back_to_raw_url() {
        // Every variant is under the floor, so the direct image link wins.
        let preview = preview_of(vec![
            variant("https://p.example/320.jpg", 320, 240),
            variant("https://p.example/108.jpg", 108, 81),
        ]);
        let e = entry("https://i.redd.it/fallback.jpg", Some(preview));
        let candidate = select_candidate(&e, 512).unwrap();
        assert_eq!(candidate.url, "https://i.redd.it/fallback.jpg");
    }

    #[test]
    fn test_unqualifying_preview_without_direct_url_yields_nothing() {
        let preview = preview_of(vec![variant("https://p.example/tiny.jpg", 100, 100)]);
        let e = entry("https://example.com/abc.jpg", Some(preview));
        assert!(select_candidate(&e, 512).is_none());
    }

    #[test]
    fn test_foreign_host_yields_nothing() {
        assert!(select_candidate(&entry("https://example.com/abc.png", None), 512).is_none());
    }

    #[test]
    fn test_direct_host_with_other_extension_yields_nothing() {
        assert!(select_candidate(&entry("https://i.redd.it/abc.png", None), 512).is_none());
    }

    #[test]
    fn test_empty_url_yields_nothing() {
        assert!(select_candidate(&entry("", None), 512).is_none());
    }

    // ==================== Entry Filter Tests ====================

    #[test]
    fn test_non_indexable_entry_never_yields() {
        let preview = preview_of(vec![variant("https://p.example/600.jpg", 600, 600)]);
        let mut e = entry("https://i.redd.it/abc.jpg", Some(preview));
        e.indexable = false;
        assert!(select_candidate(&e, 512).is_none());
    }

    #[test]
    fn test_candidate_carries_entry_metadata() {
        let candidate = select_candidate(&entry("https://i.redd.it/abc.jpg", None), 512).unwrap();
        assert_eq!(candidate.title, "a very good dog");
        assert_eq!(candidate.created_utc, 1_700_000_000);
        assert_eq!(candidate.permalink, "/r/corgi/comments/abc/a_very_good_dog/");
    }
}
