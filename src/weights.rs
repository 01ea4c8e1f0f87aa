//! Per-layer weight and bias transfer between the host and engine memory.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    Result, RuntimeErr, config,
    context::Context,
    data::bridge::{byte_range, write_f32s},
    engine::{Engine, Export},
};

const F32_SIZE: usize = size_of::<f32>();

/// The trainable parameters of one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerWeightsBundle {
    #[serde(alias = "layer")]
    pub layer_id: u32,
    pub weights: Vec<f32>,
    #[serde(default)]
    pub bias: Vec<f32>,
}

/// Where a trainable layer keeps its parameters, in bytes.
#[derive(Debug, Clone, Copy)]
struct LayerRegion {
    weight_offset: usize,
    weight_bytes: usize,
    bias_offset: usize,
    bias_bytes: usize,
}

impl LayerRegion {
    /// Resolves the region of `layer`, `None` if the layer isn't trainable.
    ///
    /// Both ranges are checked against the engine's memory and must hold whole `f32`s.
    fn resolve<E: Engine>(ctx: &mut Context<E>, layer: u32) -> Result<Option<Self>> {
        let (Some(weight_offset), Some(weight_bytes), Some(bias_offset), Some(bias_bytes)) = (
            ctx.try_query_usize(&Export::LayerWeightOffset(layer))?,
            ctx.try_query_usize(&Export::LayerWeightByteSize(layer))?,
            ctx.try_query_usize(&Export::LayerBiasOffset(layer))?,
            ctx.try_query_usize(&Export::LayerBiasByteSize(layer))?,
        ) else {
            return Ok(None);
        };

        for (export, bytes) in [
            (Export::LayerWeightByteSize(layer), weight_bytes),
            (Export::LayerBiasByteSize(layer), bias_bytes),
        ] {
            if bytes % F32_SIZE != 0 {
                return Err(RuntimeErr::InvalidReturn {
                    export: export.name(),
                    got: "a byte size that isn't a whole number of f32",
                });
            }
        }

        let memory = ctx.engine().memory().len();
        byte_range(memory, weight_offset, weight_bytes)?;
        byte_range(memory, bias_offset, bias_bytes)?;

        Ok(Some(Self {
            weight_offset,
            weight_bytes,
            bias_offset,
            bias_bytes,
        }))
    }
}

/// Copies the parameters of every trainable layer out of the engine.
///
/// # Returns
/// One bundle per trainable layer, in layer order. Layers that don't report all of
/// their weight and bias exports are skipped.
pub fn export_weights<E: Engine>(ctx: &mut Context<E>) -> Result<Vec<LayerWeightsBundle>> {
    let total = ctx.total_layers()?;
    let mut bundles = Vec::new();

    for layer in 0..total {
        let Some(region) = LayerRegion::resolve(ctx, layer)? else {
            debug!(layer = layer; "layer has no weights, skipped");
            continue;
        };

        let weights = ctx.read_f32s(region.weight_offset, region.weight_bytes / F32_SIZE)?;
        let bias = ctx.read_f32s(region.bias_offset, region.bias_bytes / F32_SIZE)?;
        debug!(layer = layer, weights = weights.len(), bias = bias.len(); "layer exported");

        bundles.push(LayerWeightsBundle {
            layer_id: layer,
            weights,
            bias,
        });
    }

    info!(layers = bundles.len(); "weights exported");
    Ok(bundles)
}

/// Overwrites engine parameters with the given bundles.
///
/// Every bundle is validated before anything is written, so a failing call leaves the
/// engine's memory untouched.
///
/// # Arguments
/// * `ctx` - The context owning the engine.
/// * `bundles` - Parameters to load, in any order.
///
/// # Errors
/// `RuntimeErr::UnknownLayer` if a bundle addresses a layer that doesn't exist or isn't
/// trainable, `RuntimeErr::WeightsLengthMismatch` or `RuntimeErr::BiasLengthMismatch` if
/// its vectors don't match the layer's.
pub fn import_weights<E: Engine>(
    ctx: &mut Context<E>,
    bundles: &[LayerWeightsBundle],
) -> Result<()> {
    let total = ctx.total_layers()?;
    let mut staged = Vec::with_capacity(bundles.len());

    for bundle in bundles {
        let layer = bundle.layer_id;
        if layer >= total {
            return Err(RuntimeErr::UnknownLayer { layer });
        }

        let Some(region) = LayerRegion::resolve(ctx, layer)? else {
            return Err(RuntimeErr::UnknownLayer { layer });
        };

        if bundle.weights.len() * F32_SIZE != region.weight_bytes {
            return Err(RuntimeErr::WeightsLengthMismatch {
                layer,
                got: bundle.weights.len(),
                expected: region.weight_bytes / F32_SIZE,
            });
        }

        if bundle.bias.len() * F32_SIZE != region.bias_bytes {
            return Err(RuntimeErr::BiasLengthMismatch {
                layer,
                got: bundle.bias.len(),
                expected: region.bias_bytes / F32_SIZE,
            });
        }

        staged.push((region, bundle));
    }

    let memory = ctx.engine_mut().memory_mut();
    for (region, bundle) in staged {
        write_f32s(memory, region.weight_offset, &bundle.weights)?;
        write_f32s(memory, region.bias_offset, &bundle.bias)?;
    }

    info!(layers = bundles.len(); "weights imported");
    Ok(())
}

/// Writes bundles to a JSON file.
pub fn save_json<P: AsRef<Path>>(path: P, bundles: &[LayerWeightsBundle]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, bundles)?;
    writer.flush()?;
    Ok(())
}

/// Reads bundles back from a JSON file.
pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Vec<LayerWeightsBundle>> {
    config::load_json(path)
}
