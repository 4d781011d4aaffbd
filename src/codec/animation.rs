//! Animation layout:
//!
//! ```text
//! bytes 0..2    interval in ms (u16 LE)
//! bytes 2..4    frame width
//! bytes 4..6    frame height
//! bytes 6..8    frame count
//! then ceil(w*h/2) bytes of packed 4-bit pixels per frame
//! ```

use super::{push_u16, read_u16};
use crate::error::{AssetError, Result};
use crate::sprite::Bitmap;

const HEADER_LEN: usize = 8;

/// Frames, frame size and playback interval of an animation.
///
/// The frame size is stored separately so that an animation with no frames
/// keeps the dimensions its header declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationData {
    pub interval: u16,
    pub width: u16,
    pub height: u16,
    pub frames: Vec<Bitmap>,
}

impl AnimationData {
    /// Take the frame size from the first frame, or 0x0 if there is none.
    pub fn new(frames: Vec<Bitmap>, interval: u16) -> Self {
        let (width, height) = frames
            .first()
            .map(|f| (f.width(), f.height()))
            .unwrap_or((0, 0));
        Self {
            interval,
            width,
            height,
            frames,
        }
    }
}

/// Pack an animation into bytes. Every frame must be `width` x `height`.
pub fn encode_animation(data: &AnimationData) -> Result<Vec<u8>> {
    let (width, height) = (data.width, data.height);
    let frames = &data.frames;

    for frame in frames {
        if frame.width() != width || frame.height() != height {
            return Err(AssetError::InconsistentFrameSize {
                expected_width: width,
                expected_height: height,
                width: frame.width(),
                height: frame.height(),
            });
        }
    }

    let count = u16::try_from(frames.len()).map_err(|_| AssetError::DimensionOverflow {
        field: "frame count",
        value: frames.len(),
    })?;

    let frame_len = Bitmap::data_length(width, height);
    let mut out = Vec::with_capacity(HEADER_LEN + frame_len * frames.len());
    push_u16(&mut out, data.interval);
    push_u16(&mut out, width);
    push_u16(&mut out, height);
    push_u16(&mut out, count);
    for frame in frames {
        out.extend_from_slice(frame.data());
    }

    Ok(out)
}

/// Unpack an animation. Every frame gets origin (0, 0).
pub fn decode_animation(bytes: &[u8]) -> Result<AnimationData> {
    if bytes.len() < HEADER_LEN {
        return Err(AssetError::TruncatedData {
            expected: HEADER_LEN,
            actual: bytes.len(),
        });
    }

    let interval = read_u16(bytes, 0);
    let width = read_u16(bytes, 2);
    let height = read_u16(bytes, 4);
    let count = read_u16(bytes, 6) as usize;
    let frame_len = Bitmap::data_length(width, height);

    let expected = HEADER_LEN + frame_len * count;
    if bytes.len() != expected {
        return Err(AssetError::TruncatedData {
            expected,
            actual: bytes.len(),
        });
    }

    let frames = (0..count)
        .map(|index| {
            let start = HEADER_LEN + index * frame_len;
            Bitmap::from_data(width, height, bytes[start..start + frame_len].to_vec())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AnimationData {
        interval,
        width,
        height,
        frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let frames = vec![Bitmap::new(3, 3), Bitmap::new(3, 3)];
        let bytes = encode_animation(&AnimationData::new(frames, 500)).unwrap();
        assert_eq!(&bytes[..8], &[0xf4, 0x01, 3, 0, 3, 0, 2, 0]);
        assert_eq!(bytes.len(), 8 + 2 * 5);
    }

    #[test]
    fn test_mismatched_frames_rejected() {
        let frames = vec![Bitmap::new(2, 2), Bitmap::new(3, 2)];
        assert!(matches!(
            encode_animation(&AnimationData::new(frames, 100)),
            Err(AssetError::InconsistentFrameSize { .. })
        ));
    }

    #[test]
    fn test_truncated_frame_rejected() {
        let mut bytes = encode_animation(&AnimationData::new(vec![Bitmap::new(4, 4)], 100)).unwrap();
        bytes.pop();
        assert!(decode_animation(&bytes).is_err());
    }

    #[test]
    fn test_zero_area_frames() {
        let bytes = [100, 0, 0, 0, 5, 0, 2, 0];
        let decoded = decode_animation(&bytes).unwrap();
        assert_eq!(decoded.frames.len(), 2);
        assert_eq!(decoded.frames[0].height(), 5);
    }

    #[test]
    fn test_empty_animation_keeps_frame_size() {
        let bytes = [100, 0, 5, 0, 3, 0, 0, 0];
        let decoded = decode_animation(&bytes).unwrap();
        assert!(decoded.frames.is_empty());
        assert_eq!((decoded.width, decoded.height), (5, 3));
        assert_eq!(encode_animation(&decoded).unwrap(), bytes);
    }
}
