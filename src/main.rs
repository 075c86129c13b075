//! Demo driver: synthesizes a small image, runs it through the statistics
//! pass and the per-block partition search/endpoint pipeline, and prints a
//! summary, the way `tinyavif`'s own `main.rs` wires its encoder stages
//! together end to end.

use clap::Parser;

use astc_core::block::{DecodeMode, EncoderConfig, ErrorWeightBlock, ImageBlock};
use astc_core::directions::DirectionMethod;
use astc_core::endpoints::{unpack_color_endpoints, EndpointFormat};
use astc_core::math::Vec4;
use astc_core::partition_search::find_best_partitionings;
use astc_core::tables::{Footprint, NUM_QUANT_LEVELS};
use astc_core::variance::{compute_averages_and_variances, Image, StatsConfig};

#[derive(Parser, Debug)]
#[command(about = "Demo driver exercising the ASTC core compression pipeline end to end")]
struct Cli {
  /// Logical image width in texels.
  #[arg(long, default_value_t = 16)]
  width: usize,

  /// Logical image height in texels.
  #[arg(long, default_value_t = 16)]
  height: usize,

  /// Block footprint width in texels.
  #[arg(long, default_value_t = 4)]
  block_x: u8,

  /// Block footprint height in texels.
  #[arg(long, default_value_t = 4)]
  block_y: u8,

  /// Partition count to search (1-4).
  #[arg(long, default_value_t = 2)]
  partitions: usize,

  /// Quantization level used for the endpoint round-trip demo (0-20).
  #[arg(long, default_value_t = 19)]
  quant_level: usize,
}

/// Builds a synthetic gradient image: each texel's RGB ramps with x, alpha
/// is constant. Padding texels replicate the nearest edge sample.
fn synth_image(width: usize, height: usize, padding: usize) -> Vec<[f32; 4]> {
  let px = width + 2 * padding;
  let py = height + 2 * padding;
  let mut data = vec![[0.0f32; 4]; px * py];
  for y in 0..py {
    for x in 0..px {
      let sx = x.saturating_sub(padding).min(width - 1);
      let sy = y.saturating_sub(padding).min(height - 1);
      let v = sx as f32 / (width - 1).max(1) as f32;
      let _ = sy;
      data[x + y * px] = [v, 1.0 - v, 0.5, 1.0];
    }
  }
  data
}

fn main() {
  let cli = Cli::parse();

  let padding = 2;
  let data = synth_image(cli.width, cli.height, padding);
  let image = Image { xsize: cli.width, ysize: cli.height, zsize: 1, padding, data: &data };
  let stats_cfg = StatsConfig::default();
  let stats = compute_averages_and_variances(&image, &stats_cfg);

  println!(
    "statistics: {}x{} texels, average at (0,0) = {:?}, variance at center = {:?}",
    stats.xsize,
    stats.ysize,
    stats.average(0, 0, 0),
    stats.variance(cli.width / 2, cli.height / 2, 0)
  );

  let footprint = Footprint::new_2d(cli.block_x, cli.block_y);
  let texel_count = footprint.texel_count();
  let texels: Vec<Vec4> = (0..texel_count)
    .map(|i| {
      let v = i as f32 / (texel_count - 1).max(1) as f32;
      Vec4::new(v, 1.0 - v, 0.5, 1.0)
    })
    .collect();
  let block = ImageBlock::new(footprint, texels);

  let error_weights = vec![Vec4::splat(1.0); texel_count];
  let ewb = ErrorWeightBlock::new(error_weights);

  let result = find_best_partitionings(
    DirectionMethod::Eigenvector,
    footprint,
    cli.partitions,
    &block,
    &ewb,
    1024,
    4,
  );
  println!(
    "partition search ({}x{} block, P={}): top uncorrelated seeds = {:?}, top same-chroma seeds = {:?}",
    cli.block_x, cli.block_y, cli.partitions, result.uncorrelated, result.samechroma
  );

  let level = cli.quant_level.min(NUM_QUANT_LEVELS - 1);
  let input = [200u8, 50u8];
  let (ep0, ep1, nan_endpoint) = unpack_color_endpoints(
    DecodeMode::Ldr,
    EndpointFormat::Luminance,
    level,
    &input,
    EncoderConfig::default().alpha_force_use_of_hdr,
  );
  println!("luminance endpoint unpack at level {level}: ep0={ep0:?} ep1={ep1:?} nan_endpoint={nan_endpoint}");
}
