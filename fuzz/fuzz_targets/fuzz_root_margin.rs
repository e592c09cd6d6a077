#![no_main]

use folio_core::{Rect, RootMargin, visible_fraction};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 256 {
        return;
    }

    // Parsing must never panic.
    let Ok(margin) = text.parse::<RootMargin>() else {
        return;
    };
    for edge in [margin.top, margin.right, margin.bottom, margin.left] {
        assert!(edge.is_finite(), "parsed margin must be finite: {text:?}");
    }

    // Display output must parse back to the same margin.
    let printed = margin.to_string();
    let reparsed: RootMargin = printed.parse().expect("display output must parse");
    assert_eq!(reparsed, margin);

    // Visible fraction stays a fraction whatever the margin.
    let viewport = Rect::new(0.0, 0.0, 1024.0, 768.0);
    let target = Rect::new(10.0, 700.0, 300.0, 200.0);
    let fraction = visible_fraction(&target, &viewport, &margin);
    assert!((0.0..=1.0).contains(&fraction), "fraction {fraction} for {text:?}");
});
