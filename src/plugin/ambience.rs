//! nih-plug adapter for the ambience reverb.

use std::sync::Arc;

use nih_plug::prelude::*;

use super::{float_param, initialize_effect, process_status, AUDIO_IO_LAYOUTS, EMAIL, VENDOR};
use crate::engines::ambience::{self as engine, Ambience};
use crate::params::ParameterStore;
use crate::processor::Effect;

/// Host-facing parameters. IDs match the ambience parameter table.
#[derive(Params)]
pub struct AmbienceParams {
    #[id = "size"]
    pub size: FloatParam,

    #[id = "hf"]
    pub hf: FloatParam,

    #[id = "mix"]
    pub mix: FloatParam,

    #[id = "output"]
    pub output: FloatParam,
}

impl AmbienceParams {
    pub fn new(store: &Arc<ParameterStore>) -> Self {
        Self {
            size: float_param(store, engine::SIZE),
            hf: float_param(store, engine::HF),
            mix: float_param(store, engine::MIX),
            output: float_param(store, engine::OUTPUT),
        }
    }

    /// Copy every host value into the store. Runs before each prepare so
    /// the first block sees what the host has restored.
    pub fn sync(&self, store: &ParameterStore) {
        store.set_value(engine::SIZE, self.size.value());
        store.set_value(engine::HF, self.hf.value());
        store.set_value(engine::MIX, self.mix.value());
        store.set_value(engine::OUTPUT, self.output.value());
    }
}

pub struct AmbiencePlugin {
    params: Arc<AmbienceParams>,
    ambience: Ambience,
}

impl Default for AmbiencePlugin {
    fn default() -> Self {
        let store = Arc::new(ParameterStore::new(engine::PARAMS));
        Self {
            params: Arc::new(AmbienceParams::new(&store)),
            ambience: Ambience::new(store),
        }
    }
}

impl Plugin for AmbiencePlugin {
    const NAME: &'static str = "Loveless Ambience";
    const VENDOR: &'static str = VENDOR;
    const URL: &'static str = "";
    const EMAIL: &'static str = EMAIL;
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = AUDIO_IO_LAYOUTS;

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        self.params.sync(self.ambience.params());
        initialize_effect(Self::NAME, buffer_config, |sample_rate, max_block_size| {
            self.ambience.prepare(sample_rate, max_block_size)
        })
    }

    fn reset(&mut self) {
        self.ambience.reset();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let result = self.ambience.process(buffer.as_slice());
        process_status(result, self.ambience.tail_samples())
    }
}

impl ClapPlugin for AmbiencePlugin {
    const CLAP_ID: &'static str = "com.loveless-audio.ambience-v1";
    const CLAP_DESCRIPTION: Option<&'static str> = Some("Small room diffusion reverb");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Reverb,
    ];
}

impl Vst3Plugin for AmbiencePlugin {
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssAmbience001";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Reverb];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_match_table() {
        let plugin = AmbiencePlugin::default();
        let params = plugin.params();
        let map = params.param_map();

        let ids: Vec<&str> = map.iter().map(|(id, _, _)| id.as_str()).collect();
        assert_eq!(ids, ["size", "hf", "mix", "output"]);
    }

    #[test]
    fn test_sync_copies_host_values() {
        let plugin = AmbiencePlugin::default();
        let store = plugin.ambience.params().clone();
        store.set("size", 2.0).unwrap();
        store.set("output", -12.0).unwrap();

        plugin.params.sync(&store);

        assert_eq!(store.get("size"), Some(7.0));
        assert_eq!(store.get("output"), Some(0.0));
    }
}
