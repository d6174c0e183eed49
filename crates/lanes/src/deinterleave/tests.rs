use super::*;
use crate::arch::{portable, Backend};

fn reference<T: Lane>(interleaved: &[T], channels: usize) -> Vec<Vec<T>> {
    let mut out = vec![Vec::new(); channels];
    portable::deinterleave_into(interleaved, &mut out);
    out
}

#[test]
fn test_rgb_example() {
    let rgb = [255u8, 0, 0, 0, 255, 0, 0, 0, 255, 128, 128, 128];
    let planes = deinterleave(&rgb, 3).unwrap();

    assert_eq!(planes.channel_count(), 3);
    assert_eq!(planes.pixels(), 4);
    assert_eq!(planes.unprocessed(), 0);
    assert_eq!(planes.channel(0), Some(&[255, 0, 0, 128][..]));
    assert_eq!(planes.channel(1), Some(&[0, 255, 0, 128][..]));
    assert_eq!(planes.channel(2), Some(&[0, 0, 255, 128][..]));
    assert_eq!(planes.channel(3), None);
}

#[test]
fn test_planar_indices() {
    assert_eq!(planar_indices(4, 3), vec![0, 3, 6, 9, 1, 4, 7, 10, 2, 5, 8, 11]);
    assert_eq!(planar_indices(3, 1), vec![0, 1, 2]);
    assert!(planar_indices(0, 3).is_empty());
}

#[test]
fn test_round_trip_whole_blocks() {
    for channels in 1..=5 {
        for blocks in 1..=3 {
            let len = channels * BLOCK_PIXELS * blocks;
            let data: Vec<u8> = (0..len).map(|i| (i * 37 % 251) as u8).collect();
            let planes = deinterleave(&data, channels).unwrap();
            assert_eq!(planes.pixels(), BLOCK_PIXELS * blocks);
            assert_eq!(planes.interleave(), data, "channels={channels} blocks={blocks}");
        }
    }
}

#[test]
fn test_length_not_multiple_of_channels() {
    let err = deinterleave(&[0u8; 10], 3).unwrap_err();
    assert_eq!(
        err,
        LaneError::InvalidLength {
            actual: 10,
            rule: LengthRule::MultipleOf(3),
        }
    );
}

#[test]
fn test_zero_channels() {
    assert_eq!(deinterleave(&[1u8, 2], 0), Err(LaneError::InvalidChannelCount));
    assert_eq!(Deinterleaver::new(0), Err(LaneError::InvalidChannelCount));
}

#[test]
fn test_channel_count_beyond_index_space() {
    assert_eq!(deinterleave::<u8>(&[], usize::MAX / 8), Err(LaneError::InvalidChannelCount));
    assert_eq!(deinterleave::<u8>(&[], usize::MAX), Err(LaneError::InvalidChannelCount));
    assert_eq!(Deinterleaver::new((1 << 28) + 1), Err(LaneError::InvalidChannelCount));
    assert_eq!(Deinterleaver::new(1 << 28).unwrap().block_len(), 1 << 32);
}

#[test]
fn test_single_pixel_of_many_channels() {
    let channels = 1 << 16;
    let pixel: Vec<u16> = (0..channels).map(|c| c as u16).collect();
    for tail in TailPolicy::ALL {
        let result = Deinterleaver::new(channels).unwrap().with_tail(tail).run(&pixel);
        match tail {
            TailPolicy::Process => {
                let planes = result.unwrap();
                assert_eq!(planes.pixels(), 1);
                assert_eq!(planes.channel(channels - 1), Some(&[u16::MAX][..]));
            }
            TailPolicy::Skip => assert_eq!(result.unwrap().unprocessed(), channels),
            TailPolicy::Reject => assert!(result.is_err()),
        }
    }
}

#[test]
fn test_empty_input() {
    let planes = deinterleave::<u8>(&[], 3).unwrap();
    assert_eq!(planes.channel_count(), 3);
    assert_eq!(planes.pixels(), 0);
}

#[test]
fn test_tail_process() {
    // One whole RGB block and 4 pixels of tail.
    let data: Vec<u8> = (0..60).collect();
    let planes = deinterleave(&data, 3).unwrap();
    assert_eq!(planes.pixels(), 20);
    assert_eq!(planes.unprocessed(), 0);
    assert_eq!(planes.into_planes(), reference(&data, 3));
}

#[test]
fn test_tail_skip() {
    let data: Vec<u8> = (0..60).collect();
    let planes = Deinterleaver::new(3)
        .unwrap()
        .with_tail(TailPolicy::Skip)
        .run(&data)
        .unwrap();
    assert_eq!(planes.pixels(), 16);
    assert_eq!(planes.unprocessed(), 12);
    assert_eq!(planes.into_planes(), reference(&data[..48], 3));

    // Shorter than one block: nothing processed.
    let planes = Deinterleaver::new(3)
        .unwrap()
        .with_tail(TailPolicy::Skip)
        .run(&[1u8, 2, 3, 4, 5, 6])
        .unwrap();
    assert_eq!(planes.pixels(), 0);
    assert_eq!(planes.unprocessed(), 6);
}

#[test]
fn test_tail_reject() {
    let d = Deinterleaver::new(3).unwrap().with_tail(TailPolicy::Reject);
    assert_eq!(
        d.run(&[0u8; 60]),
        Err(LaneError::InvalidLength {
            actual: 60,
            rule: LengthRule::MultipleOf(48),
        })
    );
    assert_eq!(d.run(&[7u8; 96]).unwrap().pixels(), 32);
}

#[test]
fn test_every_backend_matches_reference() {
    let lengths = [0, 3, 48, 51, 96, 141];
    for backend in Backend::available() {
        let dispatcher = Dispatcher::with_backend(backend).unwrap();
        for channels in [1, 2, 3, 4, 6] {
            let d = Deinterleaver::new(channels).unwrap().with_dispatcher(dispatcher);
            for &len in &lengths {
                let len = len / channels * channels;
                let data: Vec<u8> = (0..len).map(|i| (i * 13 + 5) as u8).collect();
                let planes = d.run(&data).unwrap();
                assert_eq!(
                    planes.into_planes(),
                    reference(&data, channels),
                    "{backend} channels={channels} len={len}"
                );
            }
        }
    }
}

#[test]
fn test_wide_lanes() {
    let data: Vec<f32> = (0..(4 * BLOCK_PIXELS + 8)).map(|i| i as f32 * 0.5).collect();
    let planes = deinterleave(&data, 4).unwrap();
    assert_eq!(planes.into_planes(), reference(&data, 4));

    let data: Vec<u16> = (0..96).collect();
    let planes = deinterleave(&data, 2).unwrap();
    assert_eq!(planes.channel(1).map(|c| c[..3].to_vec()), Some(vec![1, 3, 5]));
}

#[test]
fn test_interleave() {
    let r = [1u8, 2, 3];
    let g = [4u8, 5, 6];
    assert_eq!(interleave(&[&r[..], &g[..]]), Ok(vec![1, 4, 2, 5, 3, 6]));
    assert_eq!(interleave::<u8>(&[]), Err(LaneError::InvalidChannelCount));
    assert_eq!(
        interleave(&[&r[..], &g[..2]]),
        Err(LaneError::length_mismatch(3, 2))
    );
}

#[test]
fn test_accessors() {
    let d = Deinterleaver::new(4).unwrap();
    assert_eq!(d.channels(), 4);
    assert_eq!(d.tail(), TailPolicy::Process);
    assert_eq!(d.block_len(), 64);
    assert_eq!(TailPolicy::default(), TailPolicy::Process);
}

#[test]
fn test_tail_policy_names() {
    for policy in TailPolicy::ALL {
        assert_eq!(policy.to_string().parse(), Ok(policy));
    }
    assert_eq!("SKIP".parse(), Ok(TailPolicy::Skip));
    assert!("drop".parse::<TailPolicy>().is_err());
}
