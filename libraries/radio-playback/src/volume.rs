//! Volume control with logarithmic scaling
//!
//! Volume range is 0-100%, mapped to -60 dB to 0 dB before it reaches an
//! engine handle as a linear gain.

/// Volume level with its cached perceptual gain
#[derive(Debug, Clone)]
pub struct Volume {
    /// Volume level (0-100)
    level: u8,

    /// Cached linear gain multiplier
    linear_gain: f32,
}

impl Volume {
    /// Create new volume controller, clamping to 100
    pub fn new(level: u8) -> Self {
        let level = level.min(100);
        Self {
            level,
            linear_gain: Self::calculate_linear_gain(level),
        }
    }

    /// Set volume level (0-100)
    pub fn set_level(&mut self, level: u8) {
        self.level = level.min(100);
        self.linear_gain = Self::calculate_linear_gain(self.level);
    }

    /// Current volume level (0-100)
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Linear gain handed to engine handles
    pub fn gain(&self) -> f32 {
        self.linear_gain
    }

    /// gain = 10^((level% - 100) * 0.6 / 20)
    ///
    /// - 0%   → silence
    /// - 50%  → -30 dB → 0.0316
    /// - 80%  → -12 dB → 0.251 (default)
    /// - 100% →   0 dB → 1.0
    fn calculate_linear_gain(level: u8) -> f32 {
        if level == 0 {
            return 0.0;
        }

        let db = (level as f32 - 100.0) * 0.6;
        10.0_f32.powf(db / 20.0)
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(80)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_volume_level_clamps() {
        let mut vol = Volume::new(50);
        vol.set_level(75);
        assert_eq!(vol.level(), 75);

        vol.set_level(150);
        assert_eq!(vol.level(), 100);
        assert_eq!(Volume::new(200).level(), 100);
    }

    #[test]
    fn gain_calculation() {
        assert_eq!(Volume::new(0).gain(), 0.0);
        assert!((Volume::new(100).gain() - 1.0).abs() < 0.001);
        assert!((Volume::new(50).gain() - 0.0316).abs() < 0.001);
        assert!((Volume::new(80).gain() - 0.251).abs() < 0.01);
    }

    #[test]
    fn gain_is_monotonic() {
        let gains: Vec<f32> = (0..=100).map(|level| Volume::new(level).gain()).collect();
        assert!(gains.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
