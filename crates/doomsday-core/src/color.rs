//! Expiry gradient: days remaining to a red-to-green card color.

/// RGB color with fractional channels in `0.0..=255.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    /// Red channel.
    pub red: f64,
    /// Green channel.
    pub green: f64,
    /// Blue channel.
    pub blue: f64,
}

impl Rgb {
    /// Already expired.
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    /// Fewer than three days left.
    pub const RED: Rgb = Rgb::new(229.0, 53.0, 69.0);
    /// One week left.
    pub const ORANGE: Rgb = Rgb::new(253.0, 126.0, 20.0);
    /// Two weeks left.
    pub const AMBER: Rgb = Rgb::new(255.0, 193.0, 7.0);
    /// Three weeks left.
    pub const YELLOW: Rgb = Rgb::new(200.0, 185.0, 15.0);
    /// Four weeks or more left.
    pub const GREEN: Rgb = Rgb::new(40.0, 167.0, 69.0);

    /// Creates a color from raw channel values.
    pub const fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }

    /// Moves `fraction` of the way from `self` toward `target`, per channel.
    pub fn shift(self, target: Rgb, fraction: f64) -> Rgb {
        Rgb {
            red: self.red + (target.red - self.red) * fraction,
            green: self.green + (target.green - self.green) * fraction,
            blue: self.blue + (target.blue - self.blue) * fraction,
        }
    }

    /// CSS hex form, e.g. `#e53545`. Channels are rounded and clamped.
    pub fn to_hex(&self) -> String {
        format!(
            "#{}",
            hex::encode([
                channel_byte(self.red),
                channel_byte(self.green),
                channel_byte(self.blue)
            ])
        )
    }
}

fn channel_byte(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// `(lower, upper, start, end)` interpolation segments above the red floor.
const SEGMENTS: [(f64, f64, Rgb, Rgb); 4] = [
    (3.0, 7.0, Rgb::RED, Rgb::ORANGE),
    (7.0, 14.0, Rgb::ORANGE, Rgb::AMBER),
    (14.0, 21.0, Rgb::AMBER, Rgb::YELLOW),
    (21.0, 28.0, Rgb::YELLOW, Rgb::GREEN),
];

/// Maps days remaining onto the expiry gradient.
///
/// Below zero is black, below three is solid red, four linear segments run
/// from red to green between day 3 and day 28, and anything later is green.
/// Adjacent segments meet at the same anchor so there is no visible step.
pub fn color_for_days(days: f64) -> Rgb {
    if days < 0.0 {
        return Rgb::BLACK;
    }
    if days < 3.0 {
        return Rgb::RED;
    }

    for (lower, upper, start, end) in SEGMENTS {
        if days < upper {
            let width = upper - lower;
            return start.shift(end, 1.0 - (upper - days) / width);
        }
    }

    Rgb::GREEN
}
