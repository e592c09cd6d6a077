#![no_main]

use std::rc::Rc;

use folio_core::TimerQueue;
use folio_runtime::{DeviceProfile, NoDetection, Page, PageConfig, PageLayout};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 4096 {
        return;
    }

    // Both loaders must reject or accept without panicking, and anything
    // accepted must build a page.
    for loaded in [PageConfig::from_toml_str(text), PageConfig::from_json_str(text)] {
        if let Ok(config) = loaded {
            assert!(config.validate().is_ok());
            assert!(config.scroll_throttle_ms > 0);
            let page = Page::new(
                Rc::new(TimerQueue::manual()),
                &NoDetection,
                config,
                DeviceProfile::new(1280.0),
                800.0,
                PageLayout::default(),
                0,
            );
            assert!(page.is_ok());
        }
    }
});
