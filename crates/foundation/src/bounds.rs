/// Axis-aligned extent in map projection units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Builds an extent from the `[minx, miny, maxx, maxy]` layout used by
    /// web mapping libraries.
    pub fn from_array(e: [f64; 4]) -> Self {
        Aabb2 {
            min: [e[0], e[1]],
            max: [e[2], e[3]],
        }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min[0], self.min[1], self.max[0], self.max[1]]
    }

    pub fn width(&self) -> f64 {
        (self.max[0] - self.min[0]).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.max[1] - self.min[1]).max(0.0)
    }

    pub fn center(&self) -> [f64; 2] {
        [
            0.5 * (self.min[0] + self.max[0]),
            0.5 * (self.min[1] + self.max[1]),
        ]
    }

    pub fn contains(&self, p: [f64; 2]) -> bool {
        p[0] >= self.min[0] && p[0] <= self.max[0] && p[1] >= self.min[1] && p[1] <= self.max[1]
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;

    #[test]
    fn array_layout_round_trips() {
        let e = Aabb2::from_array([466560.0, 487720.0, 883439.0, 762279.0]);
        assert_eq!(e.min, [466560.0, 487720.0]);
        assert_eq!(e.to_array(), [466560.0, 487720.0, 883439.0, 762279.0]);
    }

    #[test]
    fn center_and_size() {
        let e = Aabb2::new([0.0, 10.0], [100.0, 30.0]);
        assert_eq!(e.center(), [50.0, 20.0]);
        assert_eq!(e.width(), 100.0);
        assert_eq!(e.height(), 20.0);
        assert!(e.contains([50.0, 20.0]));
        assert!(!e.contains([150.0, 20.0]));
    }

    #[test]
    fn inverted_extent_is_empty() {
        let e = Aabb2::new([10.0, 10.0], [0.0, 0.0]);
        assert!(e.is_empty());
        assert_eq!(e.width(), 0.0);
    }
}
