//! nih-plug adapter for the dub delay.

use std::sync::Arc;

use nih_plug::prelude::*;

use super::{float_param, initialize_effect, process_status, AUDIO_IO_LAYOUTS, EMAIL, VENDOR};
use crate::engines::dub_delay::{self as engine, DubDelay, FeedbackMode};
use crate::params::ParameterStore;
use crate::processor::Effect;

/// Host-facing parameters. IDs match the dub delay parameter table.
#[derive(Params)]
pub struct DubDelayParams {
    #[id = "delay"]
    pub delay: FloatParam,

    #[id = "feedback"]
    pub feedback: FloatParam,

    /// The one discrete control, shown to the host as a real choice.
    #[id = "feedbackMode"]
    pub feedback_mode: EnumParam<FeedbackMode>,

    #[id = "feedbackTone"]
    pub feedback_tone: FloatParam,

    #[id = "lfoDepth"]
    pub lfo_depth: FloatParam,

    #[id = "lfoRate"]
    pub lfo_rate: FloatParam,

    #[id = "wetMix"]
    pub wet_mix: FloatParam,

    #[id = "output"]
    pub output: FloatParam,
}

impl DubDelayParams {
    pub fn new(store: &Arc<ParameterStore>) -> Self {
        let mode_target = store.clone();
        let default_mode = FeedbackMode::from_value(engine::PARAMS[engine::FEEDBACK_MODE].default);

        Self {
            delay: float_param(store, engine::DELAY),
            feedback: float_param(store, engine::FEEDBACK),
            feedback_mode: EnumParam::new("Feedback Mode", default_mode).with_callback(Arc::new(
                move |mode: FeedbackMode| {
                    mode_target.set_value(engine::FEEDBACK_MODE, mode.to_index() as f32);
                },
            )),
            feedback_tone: float_param(store, engine::FEEDBACK_TONE),
            lfo_depth: float_param(store, engine::LFO_DEPTH),
            lfo_rate: float_param(store, engine::LFO_RATE),
            wet_mix: float_param(store, engine::WET_MIX),
            output: float_param(store, engine::OUTPUT),
        }
    }

    /// Copy every host value into the store. Runs before each prepare so
    /// the first block sees what the host has restored.
    pub fn sync(&self, store: &ParameterStore) {
        store.set_value(engine::DELAY, self.delay.value());
        store.set_value(engine::FEEDBACK, self.feedback.value());
        store.set_value(
            engine::FEEDBACK_MODE,
            self.feedback_mode.value().to_index() as f32,
        );
        store.set_value(engine::FEEDBACK_TONE, self.feedback_tone.value());
        store.set_value(engine::LFO_DEPTH, self.lfo_depth.value());
        store.set_value(engine::LFO_RATE, self.lfo_rate.value());
        store.set_value(engine::WET_MIX, self.wet_mix.value());
        store.set_value(engine::OUTPUT, self.output.value());
    }
}

pub struct DubDelayPlugin {
    params: Arc<DubDelayParams>,
    delay: DubDelay,
}

impl Default for DubDelayPlugin {
    fn default() -> Self {
        let store = Arc::new(ParameterStore::new(engine::PARAMS));
        Self {
            params: Arc::new(DubDelayParams::new(&store)),
            delay: DubDelay::new(store),
        }
    }
}

impl Plugin for DubDelayPlugin {
    const NAME: &'static str = "Loveless Dub Delay";
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

    /// The 16 second line is sized here, off the audio thread. A failed
    /// allocation is reported to the host instead of panicking.
    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        self.params.sync(self.delay.params());
        initialize_effect(Self::NAME, buffer_config, |sample_rate, max_block_size| {
            self.delay.prepare(sample_rate, max_block_size)
        })
    }

    fn reset(&mut self) {
        self.delay.reset();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let result = self.delay.process(buffer.as_slice());
        process_status(result, self.delay.tail_samples())
    }
}

impl ClapPlugin for DubDelayPlugin {
    const CLAP_ID: &'static str = "com.loveless-audio.dub-delay-v1";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Long modulated delay with a limiter in the feedback loop");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for DubDelayPlugin {
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssDubDelay001";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_match_table() {
        let plugin = DubDelayPlugin::default();
        let map = plugin.params().param_map();

        let ids: Vec<String> = map.into_iter().map(|(id, _, _)| id).collect();
        let table: Vec<&str> = engine::PARAMS.iter().map(|spec| spec.id).collect();
        assert_eq!(ids, table);
    }

    #[test]
    fn test_default_mode_is_saturate() {
        let plugin = DubDelayPlugin::default();
        assert_eq!(plugin.params.feedback_mode.value(), FeedbackMode::Saturate);
    }

    #[test]
    fn test_sync_copies_mode_index() {
        let plugin = DubDelayPlugin::default();
        let store = plugin.delay.params().clone();
        store.set("feedbackMode", 0.0).unwrap();
        store.set("lfoRate", 5.0).unwrap();

        plugin.params.sync(&store);

        assert_eq!(store.get("feedbackMode"), Some(1.0));
        let rate = store.get("lfoRate").unwrap();
        assert!((rate - 0.316).abs() < 0.01, "{rate}");
    }
}
