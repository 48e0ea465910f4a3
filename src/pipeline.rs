//! Encode/decode pipeline
//!
//! An [`Image`] owns its configuration and the three channel planes, and
//! advances them through six ordered [`Stage`]s:
//!
//! ```text
//! raster -> ColorTransform -> Subsample -> BlockTile -> ForwardTransform -> Quantize -> Zigzag
//! ```
//!
//! Decoding applies the mirror of each stage in reverse. Both directions can
//! stop part way for inspection. Each call works on fresh plane values and
//! commits them only when every requested stage succeeded, so a failed call
//! leaves the image exactly as it was.

use imgref::{ImgRef, ImgVec};
use rgb::RGB8;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adaptive_quant::per_block_plan;
use crate::block::{partition, reassemble, BlockGrid, Plane};
use crate::color::{merge_planes, split_planes};
use crate::config::CodecConfig;
use crate::consts::LEVEL_SHIFT;
use crate::dct::{forward_dct, inverse_dct};
use crate::error::{Error, Result};
use crate::quant::{dequantize, quantize, QuantPlan};
use crate::sample::{downsample, upsample};
use crate::zigzag::{unzigzag, zigzag};

/// Pipeline stages in encode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// RGB raster to Y, Cb, Cr planes
    ColorTransform,
    /// Chroma decimation
    Subsample,
    /// Planes to block grids
    BlockTile,
    /// Per-block DCT
    ForwardTransform,
    /// Coefficient quantization
    Quantize,
    /// Zigzag reordering
    Zigzag,
}

impl Stage {
    /// All stages in encode order
    pub const ALL: [Stage; 6] = [
        Stage::ColorTransform,
        Stage::Subsample,
        Stage::BlockTile,
        Stage::ForwardTransform,
        Stage::Quantize,
        Stage::Zigzag,
    ];

    /// Position in encode order (0-based)
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stage at position `index`
    #[must_use]
    pub fn from_index(index: usize) -> Option<Stage> {
        Stage::ALL.get(index).copied()
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Stage::ColorTransform => "color-transform",
            Stage::Subsample => "subsample",
            Stage::BlockTile => "block-tile",
            Stage::ForwardTransform => "forward-transform",
            Stage::Quantize => "quantize",
            Stage::Zigzag => "zigzag",
        }
    }

    #[must_use]
    pub fn next(self) -> Option<Stage> {
        Stage::from_index(self.index() + 1)
    }

    /// Stage before this one; `None` means the RGB raster.
    #[must_use]
    pub fn previous(self) -> Option<Stage> {
        self.index().checked_sub(1).and_then(Stage::from_index)
    }
}

/// One channel's data in its current representation.
#[derive(Debug, Clone)]
pub enum ChannelData {
    /// Full-resolution samples after the color transform
    Samples(Plane),
    /// Samples after decimation (luma and 4:4:4 chroma are unchanged copies)
    Subsampled(Plane),
    /// Spatial blocks
    Blocks(BlockGrid<f32>),
    /// Transform coefficients per block, natural order
    Coefficients(BlockGrid<f32>),
    /// Quantized coefficients per block, natural order
    Quantized(BlockGrid<i16>),
    /// Quantized coefficients per block, zigzag order
    Zigzagged(BlockGrid<i16>),
}

impl ChannelData {
    /// The stage that produces this representation
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            ChannelData::Samples(_) => Stage::ColorTransform,
            ChannelData::Subsampled(_) => Stage::Subsample,
            ChannelData::Blocks(_) => Stage::BlockTile,
            ChannelData::Coefficients(_) => Stage::ForwardTransform,
            ChannelData::Quantized(_) => Stage::Quantize,
            ChannelData::Zigzagged(_) => Stage::Zigzag,
        }
    }

    /// Sample plane, if this channel is in a plane representation
    pub fn plane(&self) -> Option<&Plane> {
        match self {
            ChannelData::Samples(p) | ChannelData::Subsampled(p) => Some(p),
            _ => None,
        }
    }

    /// Float block grid (spatial blocks or coefficients)
    pub fn float_blocks(&self) -> Option<&BlockGrid<f32>> {
        match self {
            ChannelData::Blocks(g) | ChannelData::Coefficients(g) => Some(g),
            _ => None,
        }
    }

    /// Quantized block grid, natural or zigzag order
    pub fn quantized_blocks(&self) -> Option<&BlockGrid<i16>> {
        match self {
            ChannelData::Quantized(g) | ChannelData::Zigzagged(g) => Some(g),
            _ => None,
        }
    }
}

/// Output of one inverse stage
enum Decoded {
    Channels([ChannelData; 3]),
    Raster(ImgVec<RGB8>),
}

/// Apply `f` to the three channels in order Y, Cb, Cr.
fn map_channels<F>(channels: &[ChannelData; 3], f: F) -> Result<[ChannelData; 3]>
where
    F: Fn(usize, &ChannelData) -> Result<ChannelData>,
{
    let [y, cb, cr] = channels;
    Ok([f(0, y)?, f(1, cb)?, f(2, cr)?])
}

/// Image under encode/decode: configuration, raster and channel planes.
#[derive(Debug, Clone)]
pub struct Image {
    config: CodecConfig,
    width: usize,
    height: usize,
    raster: Option<ImgVec<RGB8>>,
    channels: Option<[ChannelData; 3]>,
    stage: Option<Stage>,
}

impl Image {
    /// Wrap an owned RGB raster.
    ///
    /// Fails if the configuration is invalid or the dimensions do not divide
    /// into whole blocks for every plane.
    pub fn new(raster: ImgVec<RGB8>, config: CodecConfig) -> Result<Self> {
        let (width, height) = (raster.width(), raster.height());
        config.validate_dimensions(width, height)?;
        let raster = if raster.stride() == width {
            raster
        } else {
            compact(raster.as_ref())
        };
        Ok(Self {
            config,
            width,
            height,
            raster: Some(raster),
            channels: None,
            stage: None,
        })
    }

    /// Copy a borrowed RGB raster.
    pub fn from_rgb(raster: ImgRef<'_, RGB8>, config: CodecConfig) -> Result<Self> {
        config.validate_dimensions(raster.width(), raster.height())?;
        Self::new(compact(raster), config)
    }

    /// Copy packed 8-bit RGB data, 3 bytes per pixel.
    pub fn from_rgb_bytes(
        pixels: &[u8],
        width: usize,
        height: usize,
        config: CodecConfig,
    ) -> Result<Self> {
        let expected = width * height * 3;
        if pixels.len() != expected {
            return Err(Error::InvalidPixelData {
                expected,
                actual: pixels.len(),
            });
        }
        let buf = pixels
            .chunks_exact(3)
            .map(|c| RGB8::new(c[0], c[1], c[2]))
            .collect();
        Self::new(ImgVec::new(buf, width, height), config)
    }

    /// Rebuild an image from restored channel data.
    pub(crate) fn from_channels(
        config: CodecConfig,
        width: usize,
        height: usize,
        stage: Stage,
        channels: [ChannelData; 3],
    ) -> Result<Self> {
        config.validate_dimensions(width, height)?;
        if let Some(bad) = channels.iter().find(|c| c.stage() != stage) {
            return Err(Error::StageMismatch {
                expected: Some(stage),
                found: Some(bad.stage()),
            });
        }
        Ok(Self {
            config,
            width,
            height,
            raster: None,
            channels: Some(channels),
            stage: Some(stage),
        })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Last completed encode stage; `None` when the image is a raster.
    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    /// The RGB raster: the source before encoding, the reconstruction after
    /// a full decode.
    pub fn raster(&self) -> Option<ImgRef<'_, RGB8>> {
        self.raster.as_ref().map(|r| r.as_ref())
    }

    /// Take the raster out of the image
    pub fn into_raster(self) -> Option<ImgVec<RGB8>> {
        self.raster
    }

    /// The three channels (Y, Cb, Cr) in their current representation
    pub fn channels(&self) -> Option<&[ChannelData; 3]> {
        self.channels.as_ref()
    }

    /// Channel `index` (0=Y, 1=Cb, 2=Cr)
    pub fn channel(&self, index: usize) -> Option<&ChannelData> {
        self.channels.as_ref().and_then(|c| c.get(index))
    }

    /// Run every encode stage.
    pub fn encode(&mut self) -> Result<()> {
        self.encode_through(Stage::Zigzag)
    }

    /// Run encode stages after the current one, up to and including `target`.
    ///
    /// Does nothing if the image is already at or past `target`.
    pub fn encode_through(&mut self, target: Stage) -> Result<()> {
        let pending: Vec<Stage> = Stage::ALL
            .into_iter()
            .filter(|&s| Some(s) > self.stage && s <= target)
            .collect();

        let mut produced: Option<[ChannelData; 3]> = None;
        for &stage in &pending {
            let input = produced.as_ref().or(self.channels.as_ref());
            let next = self.forward(stage, input)?;
            debug!(stage = stage.name(), width = self.width, height = self.height, "encode stage");
            produced = Some(next);
        }

        if let (Some(channels), Some(&last)) = (produced, pending.last()) {
            self.channels = Some(channels);
            self.stage = Some(last);
        }
        Ok(())
    }

    /// Undo every stage, reconstructing the RGB raster.
    pub fn decode(&mut self) -> Result<()> {
        self.decode_through(Stage::ColorTransform)
    }

    /// Resume decoding from `stage`, which must be the image's current stage,
    /// down to the raster.
    pub fn decode_from(&mut self, stage: Stage) -> Result<()> {
        if self.stage != Some(stage) {
            return Err(Error::StageMismatch {
                expected: Some(stage),
                found: self.stage,
            });
        }
        self.decode()
    }

    /// Undo stages from the current one down to and including `target`.
    ///
    /// Does nothing if the image is already before `target`.
    pub fn decode_through(&mut self, target: Stage) -> Result<()> {
        let Some(current) = self.stage else {
            return Ok(());
        };
        let Some(channels) = self.channels.as_ref() else {
            return Err(Error::StageMismatch {
                expected: Some(current),
                found: None,
            });
        };

        let mut produced: Option<Decoded> = None;
        for stage in Stage::ALL.into_iter().rev().filter(|&s| s <= current && s >= target) {
            let input = match &produced {
                Some(Decoded::Channels(c)) => c,
                Some(Decoded::Raster(_)) => break,
                None => channels,
            };
            let next = self.inverse(stage, input)?;
            debug!(stage = stage.name(), width = self.width, height = self.height, "decode stage");
            produced = Some(next);
        }

        match produced {
            Some(Decoded::Channels(c)) => {
                self.channels = Some(c);
                self.stage = target.previous();
            }
            Some(Decoded::Raster(r)) => {
                self.raster = Some(r);
                self.channels = None;
                self.stage = None;
            }
            None => {}
        }
        Ok(())
    }

    /// Apply one forward stage to all planes.
    fn forward(&self, stage: Stage, input: Option<&[ChannelData; 3]>) -> Result<[ChannelData; 3]> {
        let config = &self.config;
        let n = config.get_block_size();
        let mismatch = |data: &ChannelData| Error::StageMismatch {
            expected: stage.previous(),
            found: Some(data.stage()),
        };

        if stage == Stage::ColorTransform {
            let raster = self.raster.as_ref().ok_or(Error::StageMismatch {
                expected: None,
                found: self.stage,
            })?;
            return Ok(split_planes(raster.as_ref()).map(ChannelData::Samples));
        }
        let channels = input.ok_or(Error::StageMismatch {
            expected: stage.previous(),
            found: None,
        })?;

        map_channels(channels, |index, data| match (stage, data) {
            (Stage::Subsample, ChannelData::Samples(p)) => {
                let (h, v) = config.get_subsampling().factors(index);
                Ok(ChannelData::Subsampled(downsample(p, h, v)))
            }
            (Stage::BlockTile, ChannelData::Subsampled(p)) => {
                Ok(ChannelData::Blocks(partition(p, n)?))
            }
            (Stage::ForwardTransform, ChannelData::Blocks(g)) => {
                Ok(ChannelData::Coefficients(forward_dct(g, LEVEL_SHIFT)))
            }
            (Stage::Quantize, ChannelData::Coefficients(g)) => {
                let plan = self.quant_plan(index);
                let q = quantize(
                    g,
                    &plan,
                    config.get_coeff_depth(),
                    config.get_overflow(),
                    index,
                )?;
                Ok(ChannelData::Quantized(q))
            }
            (Stage::Zigzag, ChannelData::Quantized(g)) => Ok(ChannelData::Zigzagged(zigzag(g))),
            _ => Err(mismatch(data)),
        })
    }

    /// Apply the mirror of one stage to all planes.
    fn inverse(&self, stage: Stage, channels: &[ChannelData; 3]) -> Result<Decoded> {
        let mismatch = |data: &ChannelData| Error::StageMismatch {
            expected: Some(stage),
            found: Some(data.stage()),
        };

        if stage == Stage::ColorTransform {
            let [y, cb, cr] = channels;
            return match (y, cb, cr) {
                (ChannelData::Samples(y), ChannelData::Samples(cb), ChannelData::Samples(cr)) => {
                    let planes = [y.clone(), cb.clone(), cr.clone()];
                    Ok(Decoded::Raster(merge_planes(&planes, self.config.get_range_policy())))
                }
                _ => Err(mismatch(channels.iter().find(|c| c.stage() != stage).unwrap_or(y))),
            };
        }

        let (width, height) = (self.width, self.height);
        let channels = map_channels(channels, |index, data| match (stage, data) {
            (Stage::Zigzag, ChannelData::Zigzagged(g)) => Ok(ChannelData::Quantized(unzigzag(g))),
            (Stage::Quantize, ChannelData::Quantized(g)) => {
                let plan = self.quant_plan(index);
                Ok(ChannelData::Coefficients(dequantize(g, &plan)))
            }
            (Stage::ForwardTransform, ChannelData::Coefficients(g)) => {
                Ok(ChannelData::Blocks(inverse_dct(g, LEVEL_SHIFT)))
            }
            (Stage::BlockTile, ChannelData::Blocks(g)) => {
                Ok(ChannelData::Subsampled(reassemble(g)))
            }
            (Stage::Subsample, ChannelData::Subsampled(p)) => {
                Ok(ChannelData::Samples(upsample(p, width, height)))
            }
            _ => Err(mismatch(data)),
        })?;
        Ok(Decoded::Channels(channels))
    }

    /// Quantization plan for plane `index`.
    fn quant_plan(&self, index: usize) -> QuantPlan {
        let config = &self.config;
        let (quality, n, policy) = (
            config.get_quality(),
            config.get_block_size(),
            config.get_zero_divisor(),
        );
        match config.get_saliency_map() {
            Some(map) if config.is_dynamic() => {
                let factors = config.get_subsampling().factors(index);
                per_block_plan(map, quality, n, factors, policy)
            }
            _ => QuantPlan::shared(quality, n, policy),
        }
    }
}

/// Copy a possibly strided raster into a contiguous buffer.
fn compact(raster: ImgRef<'_, RGB8>) -> ImgVec<RGB8> {
    let buf = raster.rows().flat_map(|row| row.iter().copied()).collect();
    ImgVec::new(buf, raster.width(), raster.height())
}
