//! Sampling helpers for the first-in-line age after a service completion.
//!
//! While a job of class `n` is in service the queue keeps racing two exponential
//! clocks: ticks at rate `γ` and arrivals at rate `λ`. When the served job completes
//! after `t` ticks, the age of the next head-of-line job is `t - H`, where `H` is the
//! number of tick wins before the first arrival win. If no arrival happened within
//! those `t` ticks the class is empty.

use rand::Rng;

/// Outcome of resampling the first-in-line age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextFil {
    /// No job of the class is left waiting.
    Empty,
    /// The new head-of-line job has waited this many ticks.
    Waiting(i64),
}

impl NextFil {
    /// Encode using the queue convention (`-1` for empty).
    pub fn as_fil(self) -> i64 {
        match self {
            NextFil::Empty => -1,
            NextFil::Waiting(age) => age,
        }
    }
}

/// Draw a uniform variate strictly inside `(0, 1)`.
pub fn open_unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u: f64 = rng.gen();
    if u <= 0.0 {
        f64::MIN_POSITIVE
    } else if u >= 1.0 {
        1.0 - f64::EPSILON
    } else {
        u
    }
}

/// Sample the first-in-line age after a completion from age `age`.
///
/// `arrival_rate` is the class arrival rate `λ`, `tick_rate` the global tick rate `γ`.
pub fn sample_next_fil<R: Rng + ?Sized>(
    age: i64,
    arrival_rate: f64,
    tick_rate: f64,
    rng: &mut R,
) -> NextFil {
    if age <= 0 {
        return NextFil::Empty;
    }
    let denom = arrival_rate + tick_rate;
    if denom <= 0.0 {
        return NextFil::Empty;
    }
    let beta = tick_rate / denom;
    if beta >= 1.0 {
        // λ = 0: nothing can have arrived.
        return NextFil::Empty;
    }
    if beta <= 0.0 {
        // γ = 0: an arrival wins immediately.
        return NextFil::Waiting(age);
    }

    let u = open_unit(rng);
    let h = (u.ln() / beta.ln()).floor();
    if h >= age as f64 {
        NextFil::Empty
    } else {
        NextFil::Waiting(age - h as i64)
    }
}

/// Exact distribution of [`sample_next_fil`], for enumeration-based solvers.
///
/// Entries with zero probability are omitted.
pub fn next_fil_distribution(age: i64, arrival_rate: f64, tick_rate: f64) -> Vec<(NextFil, f64)> {
    let denom = arrival_rate + tick_rate;
    if age <= 0 || denom <= 0.0 || arrival_rate <= 0.0 {
        return vec![(NextFil::Empty, 1.0)];
    }
    if tick_rate <= 0.0 {
        return vec![(NextFil::Waiting(age), 1.0)];
    }
    let beta = tick_rate / denom;
    let mut out = Vec::with_capacity(age as usize + 1);
    let mut tail = 1.0;
    for h in 0..age {
        let p = tail * (1.0 - beta);
        out.push((NextFil::Waiting(age - h), p));
        tail *= beta;
    }
    out.push((NextFil::Empty, tail));
    out
}

/// Expected waiting age after a completion, counting an emptied class as age 0.
///
/// `Σ_{j=1}^{i} j · β^{i-j} · (1-β)` with `β = γ / (λ + γ)`.
pub fn expected_next_age(age: i64, arrival_rate: f64, tick_rate: f64) -> f64 {
    next_fil_distribution(age, arrival_rate, tick_rate)
        .into_iter()
        .map(|(outcome, p)| match outcome {
            NextFil::Empty => 0.0,
            NextFil::Waiting(a) => a as f64 * p,
        })
        .sum()
}
