use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer as DecodeBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use rand::Rng;
use tracing::{debug, warn};

use crate::{
    config::ImpulseSource, dsp::reverb::ImpulseResponse, error::AssetError,
    io::samples::SampleBuffer,
};

/// Planar audio straight out of the decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: f32,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Average of all channels.
    pub fn downmix(&self) -> Vec<f32> {
        let count = self.channels.len().max(1) as f32;
        (0..self.frames())
            .map(|i| self.channels.iter().map(|c| c[i]).sum::<f32>() / count)
            .collect()
    }
}

/// Map an asset location onto the filesystem. `file://` prefixes are
/// stripped; network locations are refused.
pub fn resolve_location(location: &str) -> Result<PathBuf, AssetError> {
    let lower = location.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Err(AssetError::UnsupportedLocation(location.to_string()));
    }
    let path = location.strip_prefix("file://").unwrap_or(location);
    Ok(PathBuf::from(path))
}

/// Decode every frame of the first audio track in `path`.
pub fn decode_file(path: &Path) -> Result<DecodedAudio, AssetError> {
    let file = File::open(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AssetError::NoTrack(path.to_path_buf()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channel_count = track.codec_params.channels.map_or(0, |c| c.count());

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut scratch: Option<DecodeBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                warn!(path = %path.display(), reason, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channel_count = spec.channels.count();

        let needed = decoded.capacity() as u64;
        let too_small = scratch
            .as_ref()
            .is_none_or(|b| (b.capacity() as u64) < needed * channel_count as u64);
        if too_small {
            scratch = Some(DecodeBuffer::new(needed, spec));
        }
        if let Some(buffer) = scratch.as_mut() {
            buffer.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buffer.samples());
        }
    }

    if interleaved.is_empty() || channel_count == 0 {
        return Err(AssetError::Empty(path.to_path_buf()));
    }

    let frames = interleaved.len() / channel_count;
    let mut channels = vec![Vec::with_capacity(frames); channel_count];
    for frame in interleaved.chunks_exact(channel_count) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    debug!(
        path = %path.display(),
        frames,
        channels = channel_count,
        sample_rate,
        "Decoded audio asset"
    );

    Ok(DecodedAudio {
        channels,
        sample_rate: sample_rate as f32,
    })
}

/// Load one note recording, downmixed to mono.
pub fn load_sample(location: &str) -> Result<SampleBuffer, AssetError> {
    let path = resolve_location(location)?;
    let decoded = decode_file(&path)?;
    Ok(SampleBuffer {
        frames: decoded.downmix(),
        sample_rate: decoded.sample_rate,
    })
}

/// Load a reverb impulse response as a stereo pair at the engine rate,
/// normalised to unit energy. Mono files feed both channels.
pub fn load_impulse_response(path: &Path, sample_rate: f32) -> Result<ImpulseResponse, AssetError> {
    let decoded = decode_file(path)?;
    Ok(impulse_from_decoded(decoded, sample_rate))
}

/// Build the configured impulse response. `Ok(None)` means reverb is
/// switched off.
pub fn build_impulse<R: Rng>(
    source: &ImpulseSource,
    sample_rate: f32,
    rng: &mut R,
) -> Result<Option<ImpulseResponse>, AssetError> {
    match source {
        ImpulseSource::Synthetic { seconds } => {
            Ok(Some(ImpulseResponse::synthetic(*seconds, sample_rate, rng)))
        }
        ImpulseSource::File { path } => load_impulse_response(path, sample_rate).map(Some),
        ImpulseSource::None => Ok(None),
    }
}

fn impulse_from_decoded(decoded: DecodedAudio, sample_rate: f32) -> ImpulseResponse {
    let source_rate = decoded.sample_rate;
    let mut channels = decoded.channels.into_iter();
    let left = channels.next().unwrap_or_default();
    let right = channels.next().unwrap_or_else(|| left.clone());

    let mut ir = ImpulseResponse::from_channels(left, right, source_rate).resampled(sample_rate);
    ir.normalize();
    ir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_network_locations() {
        assert!(matches!(
            resolve_location("https://gleitz.github.io/midi-js-soundfonts/FatBoy/c4.mp3"),
            Err(AssetError::UnsupportedLocation(_))
        ));
        assert!(matches!(
            load_sample("HTTP://example.org/a4.mp3"),
            Err(AssetError::UnsupportedLocation(_))
        ));
    }

    #[test]
    fn strips_file_scheme() {
        assert_eq!(
            resolve_location("file:///srv/piano/c4.wav").unwrap(),
            PathBuf::from("/srv/piano/c4.wav")
        );
        assert_eq!(
            resolve_location("samples/c4.wav").unwrap(),
            PathBuf::from("samples/c4.wav")
        );
    }

    #[test]
    fn missing_file_reports_path() {
        let err = decode_file(Path::new("/definitely/not/here.wav")).unwrap_err();
        match err {
            AssetError::Io { path, .. } => assert_eq!(path, PathBuf::from("/definitely/not/here.wav")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn synthetic_impulse_has_configured_length() {
        use rand::{rngs::StdRng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(7);
        let ir = build_impulse(&ImpulseSource::Synthetic { seconds: 0.5 }, 1_000.0, &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(ir.len(), 500);
        assert!(build_impulse(&ImpulseSource::None, 1_000.0, &mut rng)
            .unwrap()
            .is_none());
    }

    #[test]
    fn downmix_averages_channels() {
        let audio = DecodedAudio {
            channels: vec![vec![1.0, 0.0, 0.5], vec![0.0, 0.0, -0.5]],
            sample_rate: 44_100.0,
        };
        assert_eq!(audio.frames(), 3);
        assert_eq!(audio.downmix(), vec![0.5, 0.0, 0.0]);
    }

    #[test]
    fn mono_impulse_feeds_both_channels() {
        let audio = DecodedAudio {
            channels: vec![vec![0.0, 3.0, 4.0]],
            sample_rate: 48_000.0,
        };
        let ir = impulse_from_decoded(audio, 48_000.0);
        assert_eq!(ir.channels[0], ir.channels[1]);
        assert!((ir.channels[0][1] - 0.6).abs() < 1e-6);
        assert!((ir.channels[0][2] - 0.8).abs() < 1e-6);
    }
}
