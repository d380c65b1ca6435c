use anyhow::{Context, Result};

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

const JOKES: &[&str] = &[
    "Why did the scarecrow win an award? Because he was outstanding in his field!",
    "I told my wife she was drawing her eyebrows too high. She looked <i>surprised</i>.",
    "Parallel lines have so much in common. It's a shame they'll never meet.",
    "I'm reading a book about anti-gravity. It's impossible to put down!",
];

const HEADLINES: &[&str] = &[
    "Senate passes budget resolution after long debate",
    "Central bank holds interest rates steady <b>again</b>",
    "Storm warning issued for coastal counties",
    "Quarterly earnings beat analyst expectations",
];

const SUFFIXES: &[&str] = &["", " http://t.co/abc123", " www.example.com/story", " #news", " :)"];

/// Spellings the loader must map, plus a few it must leave unset.
const TRUE_SPELLINGS: &[&str] = &["True", "true"];
const FALSE_SPELLINGS: &[&str] = &["False", "false"];
const ODD_SPELLINGS: &[&str] = &["", "yes", "1"];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let output_path = "sample_corpus.csv";
    let mut writer = csv::Writer::from_path(output_path).context("creating sample CSV")?;
    writer.write_record(["text", "humor"])?;

    let n_rows = 200;
    for i in 0..n_rows {
        let (text, humor) = match i % 10 {
            // Rows that clean down to nothing.
            0 => (String::new(), rng.pick(TRUE_SPELLINGS)),
            1 => ("<br/> http://only.link".to_string(), rng.pick(FALSE_SPELLINGS)),
            2 => (rng.pick(JOKES).to_string(), rng.pick(ODD_SPELLINGS)),
            3..=6 => (
                format!("{}{}", rng.pick(JOKES), rng.pick(SUFFIXES)),
                rng.pick(TRUE_SPELLINGS),
            ),
            _ => (
                format!("{}{}", rng.pick(HEADLINES), rng.pick(SUFFIXES)),
                rng.pick(FALSE_SPELLINGS),
            ),
        };
        writer.write_record([text.as_str(), humor])?;
    }
    writer.flush()?;

    println!("Wrote {n_rows} rows to {output_path}");
    Ok(())
}
