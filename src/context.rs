use log::debug;

use crate::{
    Result, RuntimeErr,
    data::{self, BatchPlan, EncodedDataset, LabeledDataset, MemoryWindow},
    engine::{Engine, Export, Manifest, Mode, Phase, Value},
};

/// Owns an engine for as long as the host drives it.
///
/// Every operation of the runtime takes a `&mut Context`, so only one of them can touch
/// the engine's memory at any time.
#[derive(Debug)]
pub struct Context<E: Engine> {
    engine: E,
    manifest: Manifest,
}

impl<E: Engine> Context<E> {
    /// Creates a new `Context`, caching the engine's manifest.
    pub fn new(engine: E) -> Self {
        let manifest = engine.manifest();
        debug!(
            forward_hooks = manifest.hooks(Phase::Forward).count(),
            backward_hooks = manifest.hooks(Phase::Backward).count(),
            self_tests = manifest.self_tests().len();
            "engine attached"
        );

        Self { engine, manifest }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Releases the engine.
    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Whether the engine exports `export`.
    pub fn has(&self, export: &Export) -> bool {
        self.engine.has_export(export)
    }

    /// Runs a required entry point.
    ///
    /// # Errors
    /// `RuntimeErr::MissingExport` if the engine doesn't export it, or whatever the engine
    /// fails with.
    pub fn call(&mut self, export: &Export, args: &[Value]) -> Result<Option<Value>> {
        if !self.engine.has_export(export) {
            return Err(RuntimeErr::MissingExport(export.name()));
        }

        self.engine.invoke(export, args)
    }

    /// Runs a required entry point that returns a count.
    pub fn query_u32(&mut self, export: &Export) -> Result<u32> {
        let value = self.call(export, &[])?;
        value
            .and_then(Value::as_u32)
            .ok_or_else(|| invalid_return(export, value))
    }

    /// Runs a required entry point that returns a byte offset or size.
    pub fn query_usize(&mut self, export: &Export) -> Result<usize> {
        let value = self.call(export, &[])?;
        value
            .and_then(Value::as_usize)
            .ok_or_else(|| invalid_return(export, value))
    }

    /// Runs a required entry point that returns any number.
    pub fn query_f64(&mut self, export: &Export) -> Result<f64> {
        let value = self.call(export, &[])?;
        value
            .map(Value::as_f64)
            .ok_or_else(|| invalid_return(export, value))
    }

    /// Like `query_u32`, but `None` when the entry point isn't exported.
    pub fn try_query_u32(&mut self, export: &Export) -> Result<Option<u32>> {
        if !self.has(export) {
            return Ok(None);
        }

        self.query_u32(export).map(Some)
    }

    /// Like `query_usize`, but `None` when the entry point isn't exported.
    pub fn try_query_usize(&mut self, export: &Export) -> Result<Option<usize>> {
        if !self.has(export) {
            return Ok(None);
        }

        self.query_usize(export).map(Some)
    }

    /// Like `query_f64`, but `None` when the entry point isn't exported.
    pub fn try_query_f64(&mut self, export: &Export) -> Result<Option<f64>> {
        if !self.has(export) {
            return Ok(None);
        }

        self.query_f64(export).map(Some)
    }

    pub fn learning_rate(&mut self) -> Result<f32> {
        Ok(self.query_f64(&Export::GetLearningRate)? as f32)
    }

    pub fn set_learning_rate(&mut self, learning_rate: f32) -> Result<()> {
        self.call(&Export::SetLearningRate, &[Value::F32(learning_rate)])?;
        Ok(())
    }

    pub fn total_layers(&mut self) -> Result<u32> {
        self.query_u32(&Export::TotalLayers)
    }

    /// The width of the output layer, if the engine reports it.
    pub fn output_size(&mut self) -> Result<Option<u32>> {
        match self.total_layers()? {
            0 => Ok(None),
            total => self.try_query_u32(&Export::LayerSize(total - 1)),
        }
    }

    /// Encodes samples and labels with the engine's training batch size.
    pub fn encode_training<D, L>(&mut self, data: &[D], labels: &[L]) -> Result<LabeledDataset>
    where
        D: AsRef<[f32]>,
        L: AsRef<[f32]>,
    {
        let batch_size = self.query_u32(&Mode::Training.batch_size())?;
        LabeledDataset::encode(data, labels, batch_size)
    }

    /// Encodes samples and labels with the engine's testing batch size.
    pub fn encode_testing<D, L>(&mut self, data: &[D], labels: &[L]) -> Result<LabeledDataset>
    where
        D: AsRef<[f32]>,
        L: AsRef<[f32]>,
    {
        let batch_size = self.query_u32(&Mode::Testing.batch_size())?;
        LabeledDataset::encode(data, labels, batch_size)
    }

    /// Encodes unlabeled samples with the engine's prediction batch size.
    pub fn encode_prediction<R>(&mut self, rows: &[R]) -> Result<EncodedDataset>
    where
        R: AsRef<[f32]>,
    {
        let batch_size = self.query_u32(&Export::PredictionBatchSize)?;
        EncodedDataset::encode(rows, batch_size)
    }

    /// Plans the sweep of `dataset` in `mode`.
    ///
    /// # Errors
    /// `RuntimeErr::BatchSizeMismatch` if `dataset` wasn't encoded with the batch size the
    /// engine uses for `mode`, or `RuntimeErr::InvalidReturn` if the engine can't hold a
    /// single batch.
    pub fn batch_plan(&mut self, mode: Mode, dataset: &LabeledDataset) -> Result<BatchPlan> {
        let batch_size = self.query_u32(&mode.batch_size())?;
        if dataset.batch_size() != batch_size {
            return Err(RuntimeErr::BatchSizeMismatch {
                got: dataset.batch_size(),
                expected: batch_size,
            });
        }

        let capacity = mode.batches_in_memory();
        let batches_resident = self.query_u32(&capacity)?;
        if batches_resident == 0 {
            return Err(RuntimeErr::InvalidReturn {
                export: capacity.name(),
                got: "zero batches",
            });
        }

        Ok(BatchPlan {
            batch_size,
            total_batches: dataset.total_batches(),
            batches_resident,
        })
    }

    /// Resolves the memory window an entry point reports.
    pub fn window(&mut self, offset: &Export, capacity_in_batches: u32) -> Result<MemoryWindow> {
        let base_offset = self.query_usize(offset)?;
        Ok(MemoryWindow::new(base_offset, capacity_in_batches))
    }

    /// Copies batches of `encoded` into engine memory, see `data::stream_chunk`.
    pub fn stream(
        &mut self,
        encoded: &EncodedDataset,
        window: MemoryWindow,
        batch_index: u32,
        requested: u32,
    ) -> Result<u32> {
        data::stream_chunk(
            self.engine.memory_mut(),
            encoded,
            window,
            batch_index,
            requested,
        )
    }

    /// Reads `count` values at byte `offset` of engine memory.
    pub fn read_f32s(&self, offset: usize, count: usize) -> Result<Vec<f32>> {
        data::bridge::read_f32s(self.engine.memory(), offset, count)
    }
}

fn invalid_return(export: &Export, value: Option<Value>) -> RuntimeErr {
    RuntimeErr::InvalidReturn {
        export: export.name(),
        got: value.map_or("nothing", Value::kind),
    }
}
