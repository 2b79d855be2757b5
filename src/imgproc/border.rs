/// Pixel extrapolation outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Border {
    /// Every out-of-range sample reads this value on all channels.
    Constant(u8),
    /// `aaaaaa|abcdefgh|hhhhhhh`
    Replicate,
    /// `fedcba|abcdefgh|hgfedcb`
    Reflect,
    /// `gfedcb|abcdefgh|gfedcba`
    #[default]
    Reflect101,
    /// `cdefgh|abcdefgh|abcdefg`
    Wrap,
}

impl Border {
    /// Maps `coord` into `0..len`, or `None` for a constant border.
    pub fn map(self, coord: isize, len: usize) -> Option<usize> {
        let n = len as isize;
        if n <= 0 {
            return None;
        }
        if (0..n).contains(&coord) {
            return Some(coord as usize);
        }

        match self {
            Border::Constant(_) => None,
            Border::Replicate => Some(coord.clamp(0, n - 1) as usize),
            Border::Wrap => Some(coord.rem_euclid(n) as usize),
            Border::Reflect => {
                if n == 1 {
                    return Some(0);
                }
                let period = 2 * n;
                let mut c = coord.rem_euclid(period);
                if c >= n {
                    c = period - c - 1;
                }
                Some(c as usize)
            }
            Border::Reflect101 => {
                if n == 1 {
                    return Some(0);
                }
                let period = 2 * n - 2;
                let mut c = coord.rem_euclid(period);
                if c >= n {
                    c = period - c;
                }
                Some(c as usize)
            }
        }
    }

    pub fn constant_value(self) -> u8 {
        match self {
            Border::Constant(v) => v,
            _ => 0,
        }
    }
}
