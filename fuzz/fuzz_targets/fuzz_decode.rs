#![no_main]

use libfuzzer_sys::fuzz_target;
use mangaview::decode::ImageDecoder;
use mangaview::settings::ScaleParams;
use mangaview::source::{FsSource, PageId};
use mangaview::tracker::RequestId;
use mangaview::worker::{DecodeRequest, Job, Outcome, run_job};

fuzz_target!(|data: &[u8]| {
    let req = DecodeRequest {
        generation: 1,
        index: 0,
        ticket: RequestId(1),
        params: ScaleParams::new(64, 1.0),
        job: Job::Decode {
            id: PageId::memory("fuzz", data.to_vec()),
        },
    };

    // Arbitrary bytes must decode or fail with a classified reason, never panic.
    match run_job(&ImageDecoder::default(), &FsSource, req).outcome {
        Outcome::Decoded { buffer, scaled_size } => {
            assert!(scaled_size.width >= 1 && scaled_size.width <= 64);
            assert_eq!(buffer.pixel_size(), scaled_size);
        }
        Outcome::Failed(e) => assert!(e.is_failure(), "unclassified failure: {e}"),
        Outcome::Resized { .. } => unreachable!("decode job produced a resize"),
    }
});
