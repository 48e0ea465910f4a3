//! Serializable intermediate state.
//!
//! A [`Snapshot`] captures an encoded or partially encoded [`Image`]: its
//! quantization settings, dimensions, current stage and the three channels.
//! The RGB raster is not stored. Restoring validates the record against the
//! configuration before any channel data is accepted.

use imgref::ImgVec;
use serde::{Deserialize, Serialize};

use crate::adaptive_quant::SaliencyMap;
use crate::block::{BlockGrid, Plane};
use crate::config::CodecConfig;
use crate::error::{Error, Result};
use crate::pipeline::{ChannelData, Image, Stage};
use crate::types::Subsampling;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable form of one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelRecord {
    Samples {
        width: usize,
        height: usize,
        samples: Vec<f32>,
    },
    Subsampled {
        width: usize,
        height: usize,
        samples: Vec<f32>,
    },
    Blocks(BlockGrid<f32>),
    Coefficients(BlockGrid<f32>),
    Quantized(BlockGrid<i16>),
    Zigzagged(BlockGrid<i16>),
}

impl ChannelRecord {
    fn stage(&self) -> Stage {
        match self {
            ChannelRecord::Samples { .. } => Stage::ColorTransform,
            ChannelRecord::Subsampled { .. } => Stage::Subsample,
            ChannelRecord::Blocks(_) => Stage::BlockTile,
            ChannelRecord::Coefficients(_) => Stage::ForwardTransform,
            ChannelRecord::Quantized(_) => Stage::Quantize,
            ChannelRecord::Zigzagged(_) => Stage::Zigzag,
        }
    }
}

impl From<&ChannelData> for ChannelRecord {
    fn from(data: &ChannelData) -> Self {
        let samples = |p: &Plane| (p.width(), p.height(), p.buf().clone());
        match data {
            ChannelData::Samples(p) => {
                let (width, height, samples) = samples(p);
                ChannelRecord::Samples { width, height, samples }
            }
            ChannelData::Subsampled(p) => {
                let (width, height, samples) = samples(p);
                ChannelRecord::Subsampled { width, height, samples }
            }
            ChannelData::Blocks(g) => ChannelRecord::Blocks(g.clone()),
            ChannelData::Coefficients(g) => ChannelRecord::Coefficients(g.clone()),
            ChannelData::Quantized(g) => ChannelRecord::Quantized(g.clone()),
            ChannelData::Zigzagged(g) => ChannelRecord::Zigzagged(g.clone()),
        }
    }
}

/// Versioned record of an image's intermediate state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub quality: f32,
    pub block_size: usize,
    /// Subsampling ratio label, e.g. `"4:2:0"`
    pub ratio: String,
    pub dynamic: bool,
    pub saliency_map: Option<SaliencyMap>,
    pub width: usize,
    pub height: usize,
    pub stage: Stage,
    pub channels: [ChannelRecord; 3],
}

impl Snapshot {
    /// Restore an image using default policies.
    pub fn restore(self) -> Result<Image> {
        self.restore_with(CodecConfig::new())
    }

    /// Restore an image, taking policies from `template`.
    ///
    /// Quality, block size, subsampling and the saliency settings come from
    /// the snapshot; everything else comes from `template`.
    pub fn restore_with(self, template: CodecConfig) -> Result<Image> {
        if self.version != SNAPSHOT_VERSION {
            return Err(Error::UnsupportedSnapshotVersion(self.version));
        }

        let mut config = template
            .quality(self.quality)
            .block_size(self.block_size)
            .subsampling(Subsampling::from_label(&self.ratio))
            .dynamic(self.dynamic);
        if let Some(map) = self.saliency_map {
            config = config.saliency_map(map);
        }
        config.validate_dimensions(self.width, self.height)?;

        let stage = self.stage;
        let [y, cb, cr] = self.channels;
        let channels = [
            channel_from_record(y, 0, stage, &config, self.width, self.height)?,
            channel_from_record(cb, 1, stage, &config, self.width, self.height)?,
            channel_from_record(cr, 2, stage, &config, self.width, self.height)?,
        ];
        Image::from_channels(config, self.width, self.height, stage, channels)
    }
}

/// Check one record's stage and shape, then convert it.
fn channel_from_record(
    record: ChannelRecord,
    index: usize,
    stage: Stage,
    config: &CodecConfig,
    width: usize,
    height: usize,
) -> Result<ChannelData> {
    if record.stage() != stage {
        return Err(Error::StageMismatch {
            expected: Some(stage),
            found: Some(record.stage()),
        });
    }

    let (h, v) = config.get_subsampling().factors(index);
    let (plane_w, plane_h) = (width / h, height / v);
    let n = config.get_block_size();

    let plane = |w: usize, h: usize, samples: Vec<f32>, expected: (usize, usize)| {
        if (w, h) != expected || samples.len() != w * h {
            return Err(Error::InvalidSnapshot("sample plane shape does not match configuration"));
        }
        Ok(ImgVec::new(samples, w, h))
    };
    let check_grid = |wide: usize, tall: usize, size: usize, len: usize| {
        if (wide, tall, size) != (plane_w / n, plane_h / n, n) || len != wide * tall * size * size {
            return Err(Error::InvalidSnapshot("block grid shape does not match configuration"));
        }
        Ok(())
    };

    Ok(match record {
        ChannelRecord::Samples { width: w, height: h, samples } => {
            ChannelData::Samples(plane(w, h, samples, (width, height))?)
        }
        ChannelRecord::Subsampled { width: w, height: h, samples } => {
            ChannelData::Subsampled(plane(w, h, samples, (plane_w, plane_h))?)
        }
        ChannelRecord::Blocks(g) => {
            check_grid(g.blocks_wide(), g.blocks_tall(), g.block_size(), g.as_slice().len())?;
            ChannelData::Blocks(g)
        }
        ChannelRecord::Coefficients(g) => {
            check_grid(g.blocks_wide(), g.blocks_tall(), g.block_size(), g.as_slice().len())?;
            ChannelData::Coefficients(g)
        }
        ChannelRecord::Quantized(g) => {
            check_grid(g.blocks_wide(), g.blocks_tall(), g.block_size(), g.as_slice().len())?;
            ChannelData::Quantized(g)
        }
        ChannelRecord::Zigzagged(g) => {
            check_grid(g.blocks_wide(), g.blocks_tall(), g.block_size(), g.as_slice().len())?;
            ChannelData::Zigzagged(g)
        }
    })
}

impl Image {
    /// Capture the current intermediate state.
    ///
    /// Fails if the image is a raster with nothing encoded yet.
    pub fn snapshot(&self) -> Result<Snapshot> {
        let (Some(stage), Some([y, cb, cr])) = (self.stage(), self.channels()) else {
            return Err(Error::StageMismatch {
                expected: Some(Stage::ColorTransform),
                found: None,
            });
        };
        let config = self.config();
        Ok(Snapshot {
            version: SNAPSHOT_VERSION,
            quality: config.get_quality(),
            block_size: config.get_block_size(),
            ratio: config.get_subsampling().label().to_string(),
            dynamic: config.is_dynamic(),
            saliency_map: config.get_saliency_map().cloned(),
            width: self.width(),
            height: self.height(),
            stage,
            channels: [y.into(), cb.into(), cr.into()],
        })
    }

    /// Restore from a snapshot with default policies.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        snapshot.restore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgb::RGB8;

    fn encoded(stage: Stage) -> Image {
        let pixels = (0..16 * 16)
            .map(|i| RGB8::new((i % 16 * 16) as u8, (i / 16 * 16) as u8, 90))
            .collect();
        let mut image = Image::new(ImgVec::new(pixels, 16, 16), CodecConfig::new().quality(60.0)).unwrap();
        image.encode_through(stage).unwrap();
        image
    }

    #[test]
    fn test_raster_has_no_snapshot() {
        let image = encoded(Stage::Zigzag);
        let mut raster = image.clone();
        raster.decode().unwrap();
        assert!(raster.snapshot().is_err());
    }

    #[test]
    fn test_restore_every_stage() {
        for stage in Stage::ALL {
            let image = encoded(stage);
            let snapshot = image.snapshot().unwrap();
            assert_eq!(snapshot.stage, stage);
            assert_eq!(snapshot.ratio, "4:2:0");

            let restored = Image::from_snapshot(snapshot.clone()).unwrap();
            assert_eq!(restored.stage(), Some(stage));
            assert!(restored.raster().is_none());
            assert_eq!(restored.snapshot().unwrap(), snapshot);
        }
    }

    #[test]
    fn test_rejects_wrong_version() {
        let mut snapshot = encoded(Stage::Quantize).snapshot().unwrap();
        snapshot.version = 7;
        assert_eq!(
            Image::from_snapshot(snapshot).unwrap_err(),
            Error::UnsupportedSnapshotVersion(7)
        );
    }

    #[test]
    fn test_rejects_inconsistent_channels() {
        let mut snapshot = encoded(Stage::Quantize).snapshot().unwrap();
        snapshot.stage = Stage::Zigzag;
        assert!(matches!(
            Image::from_snapshot(snapshot).unwrap_err(),
            Error::StageMismatch { .. }
        ));

        let mut snapshot = encoded(Stage::Subsample).snapshot().unwrap();
        snapshot.ratio = "4:4:4".to_string();
        assert!(matches!(
            Image::from_snapshot(snapshot).unwrap_err(),
            Error::InvalidSnapshot(_)
        ));
    }
}
