/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next_f64() * (hi - lo + 1) as f64) as i64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn patient_rating(rng: &mut SimpleRng) -> String {
    let roll = rng.next_f64();
    if roll < 0.03 {
        return String::new(); // no rating recorded
    }
    if roll < 0.11 {
        return "6".to_string(); // unrated code
    }
    if roll < 0.18 {
        return rng.range(7, 10).to_string();
    }
    rng.range(1, 5).to_string()
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let n_treatments = 120;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path("treatments.csv")
        .expect("Failed to create treatments.csv");

    writer
        .write_record([
            "TreatmentID",
            "PatientRating",
            "DoctorRating",
            "NumberOfTeeth",
            "TreatmentDuration(sec)",
            "SetupDuration(sec)",
            "Interruptions",
            "Errors",
        ])
        .expect("Failed to write header");

    for i in 0..n_treatments {
        let teeth = rng.range(1, 14);
        let interruptions = (rng.gauss(1.0, 1.2).max(0.0)) as i64;
        let errors = (rng.gauss(0.6, 0.9).max(0.0)) as i64;

        // Longer treatments for more teeth, disturbed by interruptions.
        let duration = (rng.gauss(300.0, 60.0)
            + teeth as f64 * rng.gauss(180.0, 25.0)
            + interruptions as f64 * 90.0)
            .max(120.0);
        let setup = (rng.gauss(150.0, 40.0) + teeth as f64 * 15.0).max(30.0);

        let doctor = rng.range(1, 10).to_string();
        let setup_cell = if rng.next_f64() < 0.03 {
            String::new()
        } else {
            format!("{setup:.1}")
        };

        writer
            .write_record([
                format!("T-{:03}", i + 1),
                patient_rating(&mut rng),
                doctor,
                teeth.to_string(),
                format!("{duration:.1}"),
                setup_cell,
                interruptions.to_string(),
                errors.to_string(),
            ])
            .expect("Failed to write record");
    }

    writer.flush().expect("Failed to flush CSV");
    println!("Wrote {n_treatments} treatments to treatments.csv");
}
