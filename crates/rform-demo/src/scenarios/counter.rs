#![forbid(unsafe_code)]

//! Mounted counter: a header bound to state, `+1` and reset buttons.
//!
//! Layout: `0` header, `1` "+1" button, `2` reset button.

use std::rc::Rc;

use rform_reactive::{CleanupScope, use_effect, use_state};
use rform_sync::{FormBuilder, MemorySurface, MountedForm, Result, Subject, SyncConfig};
use serde_json::{Value, json};
use tracing::{debug, info};

const INCREMENT: &str = "layout[1].onClick";
const RESET: &str = "layout[2].onClick";

fn render(form: &FormBuilder, scope: &CleanupScope) {
    let (count, _set_count, state) = use_state(0u32);
    let label = form.bind_header("Count: 0");

    scope.register(use_effect(
        move || {
            label.set(format!("Count: {}", count()));
            None
        },
        &[&state],
    ));

    let increment = state.clone();
    form.add_button_with("+1", move |subject, _| {
        increment.update(|n| *n += 1);
        debug!(%subject, count = increment.get(), "increment");
    })
    .add_button_with("Reset", move |_, _| state.set(0));
}

/// Mount the counter, click `+1` `clicks` times, reset once halfway, close
/// through the close button, and report what the surface saw.
pub fn run(subject: &str, clicks: u32, config: SyncConfig) -> Result<Value> {
    let surface = MemorySurface::new();
    let mounted = MountedForm::with_config(
        Subject::new(subject),
        Rc::new(surface.clone()),
        config,
        "Counter",
        render,
    );
    let form = mounted.mount()?;
    let doc = form.document_id().clone();

    let mut pushes = 0usize;
    for click in 1..=clicks {
        surface.push_remote(&doc, INCREMENT, json!(1))?;
        pushes += 1;
        if click == clicks / 2 {
            surface.push_remote(&doc, RESET, json!(1))?;
            pushes += 1;
        }
    }
    let header = surface.read_path(&doc, "layout[0].text").unwrap_or(Value::Null);
    let cleanups = mounted.pending_cleanups();

    surface.push_remote(&doc, rform_layout::FieldPath::CLOSE_TRIGGER, json!(1))?;
    info!(subject, clicks, %header, "counter finished");

    Ok(json!({
        "scenario": "counter",
        "subject": subject,
        "pushes": pushes,
        "header": header,
        "cleanups_run": cleanups - mounted.pending_cleanups(),
        "mounted": mounted.is_mounted(),
        "live_subscriptions": surface.live_subscriptions(),
        "surface_ops": surface.ops().len(),
    }))
}
