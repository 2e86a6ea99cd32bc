//! Drives a View with a command stream decoded from fuzz input.
//!
//! Byte 0 picks the page count, the next bytes the page heights; every
//! following pair of bytes is one command.

use std::io::Cursor;
use std::time::Duration;

use image::RgbaImage;
use mangaview::config::ViewerConfig;
use mangaview::decode::ImageDecoder;
use mangaview::settings::Settings;
use mangaview::source::{FsSource, PageId};
use mangaview::viewer::View;
use mangaview::viewport;
use mangaview::worker::DecodeWorker;

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgba8(RgbaImage::new(w, h));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("png encoding");
    out.into_inner()
}

pub fn run(data: &[u8]) {
    let Some((&count, rest)) = data.split_first() else {
        return;
    };
    let count = usize::from(count % 12);
    if rest.len() < count {
        return;
    }
    let (heights, commands) = rest.split_at(count);

    let pages: Vec<PageId> = heights
        .iter()
        .enumerate()
        .map(|(i, &h)| {
            // height 0 stands for an undecodable page
            let bytes = if h == 0 { vec![0u8; 8] } else { png(16, u32::from(h)) };
            PageId::memory(format!("{i}"), bytes)
        })
        .collect();

    let Ok(worker) = DecodeWorker::spawn(ImageDecoder::default(), FsSource, 2) else {
        return;
    };
    let mut view = View::new(worker, Settings::default(), &ViewerConfig::default(), 64, 120);
    view.load(pages, 0);

    for cmd in commands.chunks_exact(2) {
        let arg = cmd[1];
        match cmd[0] % 10 {
            0 => view.scroll_by(i64::from(arg as i8) * 8),
            1 => view.jump_to(usize::from(arg)),
            2 => view.resize(u32::from(arg).max(1), u32::from(arg / 2).max(1)),
            3 => view.set_zoom(f64::from(arg) / 32.0),
            4 => view.on_settings_changed(Settings {
                max_width: u32::from(arg),
                spacing: u32::from(arg % 16),
                ..Settings::default()
            }),
            5 => {
                view.bookmark_at(u32::from(arg));
            }
            6 => view.retry(usize::from(arg)),
            7 => {
                view.pump();
            }
            8 => {
                view.wait(Duration::from_millis(u64::from(arg % 4)));
            }
            _ => view.scroll_to(u32::from(arg) * 16),
        }
        check(&view);
    }
    view.settle(Duration::from_secs(5));
    check(&view);
}

fn check(view: &View) {
    let spacing = view.settings().spacing;
    for pair in view.pages().windows(2) {
        assert_eq!(pair[0].span().end + spacing, pair[1].span().start);
    }
    assert!(view.scroll_top() <= view.max_scroll());
    let window = viewport::visible_range(view.pages(), view.viewport())
        .map(|v| viewport::keep_window(&v, view.page_count()));
    for page in view.pages().iter().filter(|p| p.is_decoded()) {
        assert!(viewport::in_window(window.as_ref(), page.index()));
    }
}
