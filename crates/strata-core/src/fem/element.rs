//! Reference matrices of a two-node linear element of length `h`.

pub type Block = [[f64; 2]; 2];

/// ∫ N_a N_b
pub fn mass(h: f64) -> Block {
    [[h / 3.0, h / 6.0], [h / 6.0, h / 3.0]]
}

/// ∫ N_a' N_b'
pub fn stiffness(h: f64) -> Block {
    [[1.0 / h, -1.0 / h], [-1.0 / h, 1.0 / h]]
}

/// ∫ N_a N_b', independent of `h`.
pub fn gradient() -> Block {
    [[-0.5, 0.5], [-0.5, 0.5]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_of_unity() {
        // constant fields carry no strain and the full element mass
        let h = 0.25;
        let k = stiffness(h);
        let m = mass(h);
        for row in 0..2 {
            assert!((k[row][0] + k[row][1]).abs() < 1e-15);
            assert!((gradient()[row][0] + gradient()[row][1]).abs() < 1e-15);
        }
        let total: f64 = m.iter().flatten().sum();
        assert!((total - h).abs() < 1e-15);
    }
}
