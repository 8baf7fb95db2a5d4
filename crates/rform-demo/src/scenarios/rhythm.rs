#![forbid(unsafe_code)]

//! Rhythm game: a note chart scrolls left every few ticks and the player
//! presses a button when a note reaches the hit line.
//!
//! Layout:
//!
//! | Index | Element |
//! |-------|---------|
//! | 0 | spacer |
//! | 1 | score header (bound) |
//! | 2 | spacer |
//! | 3 | hit-line marker |
//! | 4 | chart header (bound) |
//! | 5 | hit-line marker |
//! | 6 | press button |

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use rform_layout::FieldPath;
use rform_reactive::{CleanupScope, Observable, TickScheduler, use_effect, use_interval};
use rform_sync::{FormBuilder, MemorySurface, Result, Subject, SyncConfig};
use serde_json::{Value, json};
use tracing::{debug, info, trace};

const CHART_LEN: usize = 30;
const NOTE: char = 'O';
const REST: char = '-';
const SCROLL_PERIOD: u32 = 4;
const SOUNDS: [&str; 3] = ["note.harp", "note.bass", "note.snare"];
const PRESS: &str = "layout[6].onClick";

/// Small deterministic generator for charts and simulated presses.
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0
    }

    /// True with probability roughly `percent / 100`.
    fn chance(&mut self, percent: u64) -> bool {
        (self.next() >> 33) % 100 < percent
    }

    fn note(&mut self) -> char {
        if self.chance(30) { NOTE } else { REST }
    }
}

fn chart_text(chart: &VecDeque<char>) -> String {
    chart.iter().skip(1).collect()
}

fn score_text(score: u32, combo: u32) -> String {
    format!("Score: {score} Combo: {combo}")
}

/// Simulate `ticks` ticks of play and report the outcome.
pub fn run(subject: &str, ticks: u64, seed: u64, config: SyncConfig) -> Result<Value> {
    let surface = MemorySurface::new();
    let scheduler = TickScheduler::new();
    let rng = Rc::new(RefCell::new(Lcg::new(seed)));
    let scope = CleanupScope::new();

    let score = Observable::new(0u32);
    let combo = Observable::new(0u32);
    let best_combo = Rc::new(Cell::new(0u32));
    let notes_played = Rc::new(Cell::new(0u32));
    let chart: Rc<RefCell<VecDeque<char>>> = Rc::new(RefCell::new({
        let mut rng = rng.borrow_mut();
        (0..CHART_LEN).map(|_| rng.note()).collect()
    }));

    let form = FormBuilder::with_config(Subject::new(subject), Rc::new(surface.clone()), config);
    let score_label = form
        .add_spacer()
        .bind_header(score_text(0, 0));
    form.add_spacer().add_header("|");
    let chart_label = form.bind_header(chart_text(&chart.borrow()));
    form.add_header("|");

    {
        let chart = Rc::clone(&chart);
        let (score, combo) = (score.clone(), combo.clone());
        let best_combo = Rc::clone(&best_combo);
        form.add_button_with("Hit!", move |subject, _| {
            let on_note = chart.borrow().front() == Some(&NOTE);
            if on_note {
                score.update(|s| *s += 10);
                combo.update(|c| *c += 1);
                best_combo.set(best_combo.get().max(combo.get()));
            } else {
                combo.set(0);
            }
            trace!(%subject, on_note, "press");
        });
    }

    {
        let (s, c) = (score.clone(), combo.clone());
        scope.register(use_effect(
            move || {
                score_label.set(score_text(s.get(), c.get()));
                None
            },
            &[&score, &combo],
        ));
    }

    {
        let chart = Rc::clone(&chart);
        let rng = Rc::clone(&rng);
        let notes_played = Rc::clone(&notes_played);
        let subject = form.subject().clone();
        scope.register(use_interval(
            &scheduler,
            move || {
                let next = rng.borrow_mut().note();
                let text = {
                    let mut chart = chart.borrow_mut();
                    chart.pop_front();
                    chart.push_back(next);
                    if chart.get(1) == Some(&NOTE) {
                        let played = notes_played.get();
                        let sound = SOUNDS[played as usize % SOUNDS.len()];
                        debug!(%subject, sound, "play sound");
                        notes_played.set(played + 1);
                    }
                    chart_text(&chart)
                };
                chart_label.set(text);
            },
            SCROLL_PERIOD,
        ));
    }

    let stop = scope.clone();
    form.show(
        "Random Rhythm",
        true,
        Some(Box::new(move |_: &Subject| {
            stop.run_all();
        })),
    )?;
    let doc = form.document_id().clone();

    let mut presses = 0u32;
    for _ in 0..ticks {
        scheduler.tick();
        if rng.borrow_mut().chance(20) {
            surface.push_remote(&doc, PRESS, json!(1))?;
            presses += 1;
        }
    }
    let timers_before_close = scheduler.pending();
    surface.push_remote(&doc, FieldPath::CLOSE_TRIGGER, json!(1))?;

    info!(subject, ticks, score = score.get(), "rhythm finished");
    Ok(json!({
        "scenario": "rhythm",
        "subject": subject,
        "ticks": scheduler.now(),
        "presses": presses,
        "score": score.get(),
        "combo": combo.get(),
        "best_combo": best_combo.get(),
        "notes_played": notes_played.get(),
        "score_text": surface.read_path(&doc, "layout[1].text").unwrap_or(Value::Null),
        "timers_before_close": timers_before_close,
        "timers_after_close": scheduler.pending(),
        "closed": !form.is_shown(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_text_drops_the_hit_slot() {
        let chart: VecDeque<char> = "O-O-".chars().collect();
        assert_eq!(chart_text(&chart), "-O-");
    }

    #[test]
    fn lcg_is_deterministic() {
        let a: Vec<u64> = {
            let mut rng = Lcg::new(9);
            (0..4).map(|_| rng.next()).collect()
        };
        let b: Vec<u64> = {
            let mut rng = Lcg::new(9);
            (0..4).map(|_| rng.next()).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn run_is_reproducible_and_tears_down() {
        let first = run("steve", 200, 42, SyncConfig::default()).expect("scenario runs");
        let second = run("steve", 200, 42, SyncConfig::default()).expect("scenario runs");
        assert_eq!(first, second);

        assert_eq!(first["ticks"], json!(200));
        assert_eq!(first["timers_before_close"], json!(1));
        assert_eq!(first["timers_after_close"], json!(0));
        assert_eq!(first["closed"], json!(true));

        let score = first["score"].as_u64().expect("number");
        let combo = first["combo"].as_u64().expect("number");
        assert_eq!(score % 10, 0);
        assert_eq!(first["score_text"], json!(score_text(score as u32, combo as u32)));
    }
}
