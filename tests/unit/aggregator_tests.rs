/*!
 * Tests for per-book annotation aggregation: chapter ordering, timestamp
 * ordering, classification, and partial-success semantics.
 */

use inkport::aggregator::{aggregate, AnnotationBlock, DEFAULT_CHAPTER_TITLE};
use inkport::colors::ColorMap;
use inkport::store::{Annotation, BookFormat, MarkupPayload};

use crate::common::{book, chapter, text_annotation, ts};

#[test]
fn test_aggregate_withTwoAnnotationsInOneChapter_shouldOrderByTimestamp() {
    let book = book("b1", "B1", "Author", BookFormat::Epub);
    let chapters = vec![chapter("c1", Some("Ch1"), 0)];
    // Inserted out of timestamp order on purpose
    let annotations = vec![
        text_annotation("a2", "b1", Some("c1"), "second", "2024-01-15T11:00:00", 1),
        text_annotation("a1", "b1", Some("c1"), "first", "2024-01-15T10:00:00", 0),
    ];

    let doc = aggregate(&book, &annotations, &chapters, &ColorMap::default());

    assert_eq!(doc.sections.len(), 1);
    assert_eq!(doc.sections[0].title, "Ch1");
    assert_eq!(doc.sections[0].blocks.len(), 2);

    match (&doc.sections[0].blocks[0], &doc.sections[0].blocks[1]) {
        (
            AnnotationBlock::Text {
                text: t1, colors: c1, ..
            },
            AnnotationBlock::Text {
                text: t2, colors: c2, ..
            },
        ) => {
            assert_eq!(t1, "first");
            assert_eq!(t2, "second");
            assert_eq!(c1.background, "#FFFF99");
            assert_eq!(c2.background, "#FFB2C8");
        }
        _ => panic!("Expected two text blocks"),
    }
}

#[test]
fn test_aggregate_withTimestampTie_shouldKeepStoreOrder() {
    let book = book("b1", "B1", "Author", BookFormat::Epub);
    let chapters = vec![chapter("c1", Some("Ch1"), 0)];
    let annotations = vec![
        text_annotation("a1", "b1", Some("c1"), "store-first", "2024-01-15T10:00:00", 0),
        text_annotation("a2", "b1", Some("c1"), "store-second", "2024-01-15T10:00:00", 0),
    ];

    let doc = aggregate(&book, &annotations, &chapters, &ColorMap::default());

    let texts: Vec<&str> = doc.sections[0]
        .blocks
        .iter()
        .map(|b| match b {
            AnnotationBlock::Text { text, .. } => text.as_str(),
            _ => panic!("Expected text block"),
        })
        .collect();
    assert_eq!(texts, vec!["store-first", "store-second"]);
}

#[test]
fn test_aggregate_withUnknownChapter_shouldUseSyntheticSectionFirst() {
    let book = book("b1", "B1", "Author", BookFormat::Epub);
    let chapters = vec![chapter("c1", Some("Ch1"), 0)];
    let annotations = vec![
        text_annotation("a1", "b1", Some("missing"), "orphan", "2024-01-15T09:00:00", 0),
        text_annotation("a2", "b1", Some("c1"), "anchored", "2024-01-15T10:00:00", 0),
    ];

    let doc = aggregate(&book, &annotations, &chapters, &ColorMap::default());

    // The orphan predates every resolvable chapter, so the synthetic
    // section comes first.
    assert_eq!(doc.sections.len(), 2);
    assert_eq!(doc.sections[0].title, DEFAULT_CHAPTER_TITLE);
    assert_eq!(doc.sections[1].title, "Ch1");
}

#[test]
fn test_aggregate_withChapterMissingTitle_shouldFallBackToUntitled() {
    let book = book("b1", "B1", "Author", BookFormat::Epub);
    let chapters = vec![chapter("c1", None, 0)];
    let annotations = vec![text_annotation(
        "a1",
        "b1",
        Some("c1"),
        "text",
        "2024-01-15T10:00:00",
        0,
    )];

    let doc = aggregate(&book, &annotations, &chapters, &ColorMap::default());

    assert_eq!(doc.sections[0].title, DEFAULT_CHAPTER_TITLE);
}

#[test]
fn test_aggregate_sectionOrder_shouldFollowFirstAppearanceInTimeSortedStream() {
    let book = book("b1", "B1", "Author", BookFormat::Epub);
    // Chapter-table order is c1, c2, but the reader visited c2 first.
    let chapters = vec![chapter("c1", Some("Ch1"), 0), chapter("c2", Some("Ch2"), 1)];
    let annotations = vec![
        text_annotation("a1", "b1", Some("c2"), "late chapter early note", "2024-01-15T08:00:00", 0),
        text_annotation("a2", "b1", Some("c1"), "early chapter late note", "2024-01-15T09:00:00", 0),
        text_annotation("a3", "b1", Some("c2"), "back to ch2", "2024-01-15T10:00:00", 0),
    ];

    let doc = aggregate(&book, &annotations, &chapters, &ColorMap::default());

    let titles: Vec<&str> = doc.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Ch2", "Ch1"]);
    assert_eq!(doc.sections[0].blocks.len(), 2);
    assert_eq!(doc.sections[1].blocks.len(), 1);

    // Within each section timestamps are non-decreasing.
    for section in &doc.sections {
        let times: Vec<_> = section.blocks.iter().map(|b| b.created()).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
    }
}

#[test]
fn test_aggregate_withUnknownKind_shouldDropAndCount() {
    let book = book("b1", "B1", "Author", BookFormat::Epub);
    let chapters = vec![chapter("c1", Some("Ch1"), 0)];
    let mut dogear = text_annotation("a1", "b1", Some("c1"), "x", "2024-01-15T10:00:00", 0);
    dogear.kind = "dogear".to_string();
    let annotations = vec![
        dogear,
        text_annotation("a2", "b1", Some("c1"), "kept", "2024-01-15T11:00:00", 0),
    ];

    let doc = aggregate(&book, &annotations, &chapters, &ColorMap::default());

    assert_eq!(doc.block_count(), 1);
    assert_eq!(doc.dropped_records, 1);
}

#[test]
fn test_aggregate_withMarkupOnNonCapableBook_shouldNeverProduceMarkupBlocks() {
    // The flag follows the book format, not the rows: even a malformed
    // markup row on a reflowable book yields no markup block.
    let book = book("b1", "B1", "Author", BookFormat::Epub);
    assert!(!book.supports_markup);

    let chapters = vec![chapter("c1", Some("Ch1"), 0)];
    let mut markup = text_annotation("a1", "b1", Some("c1"), "ignored", "2024-01-15T10:00:00", 0);
    markup.kind = "markup".to_string();
    markup.text = None;
    let annotations = vec![
        markup,
        text_annotation("a2", "b1", Some("c1"), "kept", "2024-01-15T11:00:00", 0),
    ];

    let doc = aggregate(&book, &annotations, &chapters, &ColorMap::default());

    assert!(doc
        .sections
        .iter()
        .flat_map(|s| s.blocks.iter())
        .all(|b| matches!(b, AnnotationBlock::Text { .. })));
    assert_eq!(doc.dropped_records, 1);
}

#[test]
fn test_aggregate_withMarkupOnCapableBook_shouldProduceImageBlock() {
    let book = book("b1", "B1", "Author", BookFormat::Kepub);
    let chapters = vec![chapter("c1", Some("Ch1"), 0)];
    let annotations = vec![Annotation {
        id: "m1".to_string(),
        book_id: "b1".to_string(),
        chapter_id: Some("c1".to_string()),
        kind: "markup".to_string(),
        created: ts("2024-01-15T10:00:00"),
        color_index: None,
        text: None,
        note: Some("my sketch".to_string()),
        markup: Some(MarkupPayload {
            svg: None,
            raster: vec![1, 2, 3],
        }),
    }];

    let doc = aggregate(&book, &annotations, &chapters, &ColorMap::default());

    assert_eq!(doc.block_count(), 1);
    match &doc.sections[0].blocks[0] {
        AnnotationBlock::Markup {
            raster, caption, ..
        } => {
            assert_eq!(raster, &vec![1, 2, 3]);
            assert_eq!(caption.as_deref(), Some("my sketch"));
        }
        _ => panic!("Expected markup block"),
    }
}

#[test]
fn test_aggregate_withUnknownColorIndex_shouldCountFallback() {
    let book = book("b1", "B1", "Author", BookFormat::Epub);
    let chapters = vec![chapter("c1", Some("Ch1"), 0)];
    let annotations = vec![text_annotation(
        "a1",
        "b1",
        Some("c1"),
        "text",
        "2024-01-15T10:00:00",
        42,
    )];

    let doc = aggregate(&book, &annotations, &chapters, &ColorMap::default());

    assert_eq!(doc.color_fallbacks, 1);
    match &doc.sections[0].blocks[0] {
        AnnotationBlock::Text {
            colors,
            color_fallback,
            ..
        } => {
            assert!(color_fallback);
            assert_eq!(colors.background, "#FFFFFF");
        }
        _ => panic!("Expected text block"),
    }
}

#[test]
fn test_aggregate_isDeterministic_acrossRepeatedRuns() {
    let book = book("b1", "B1", "Author", BookFormat::Epub);
    let chapters = vec![chapter("c1", Some("Ch1"), 0), chapter("c2", Some("Ch2"), 1)];
    let annotations = vec![
        text_annotation("a1", "b1", Some("c2"), "one", "2024-01-15T10:00:00", 0),
        text_annotation("a2", "b1", Some("c1"), "two", "2024-01-15T10:00:00", 1),
        text_annotation("a3", "b1", Some("c1"), "three", "2024-01-15T09:00:00", 2),
    ];

    let first = aggregate(&book, &annotations, &chapters, &ColorMap::default());
    let second = aggregate(&book, &annotations, &chapters, &ColorMap::default());

    let layout = |doc: &inkport::RenderedDocument| {
        doc.sections
            .iter()
            .map(|s| (s.title.clone(), s.blocks.len()))
            .collect::<Vec<_>>()
    };
    assert_eq!(layout(&first), layout(&second));
}
