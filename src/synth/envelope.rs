// Attack/decay envelope
//
// Shapes a plucked tone: exponential rise toward 1.0 multiplied by an
// exponential decay, env(t) = (1 - e^(-attack*t)) * e^(-decay*t)

/// Envelope rates in 1/seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    /// Attack rate (higher = faster rise)
    pub attack_rate: f64,
    /// Decay rate (higher = faster fade)
    pub decay_rate: f64,
}

impl EnvelopeParams {
    pub fn new(attack_rate: f64, decay_rate: f64) -> Self {
        Self {
            attack_rate: attack_rate.max(0.0),
            decay_rate: decay_rate.max(0.0),
        }
    }
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack_rate: 12.0,
            decay_rate: 4.0,
        }
    }
}

/// Stateless amplitude envelope
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PluckEnvelope {
    params: EnvelopeParams,
}

impl PluckEnvelope {
    pub fn new(params: EnvelopeParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> EnvelopeParams {
        self.params
    }

    /// Amplitude multiplier at `t` seconds after note start
    pub fn value_at(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        (1.0 - (-self.params.attack_rate * t).exp()) * (-self.params.decay_rate * t).exp()
    }
}
