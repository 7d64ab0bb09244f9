use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::keys::generate_key;
use crate::models::{Paste, PasteView};
use crate::storage::{Retain, Storage};
use crate::types::api::{CreatedPaste, NewPaste};
use crate::{ApiError, App};

/// How many fresh keys to try before giving up on a create.
const MAX_KEY_ATTEMPTS: usize = 8;

enum Fetch {
    Served(PasteView),
    Expired,
    Exhausted,
}

/// Store a new paste and return its key and public URL.
pub fn create(app: &App, new_paste: NewPaste) -> crate::ApiResult<CreatedPaste> {
    let created_at = app.clock.now();

    let mut paste = Paste::new(
        generate_key(),
        new_paste.content,
        created_at,
        new_paste.ttl_seconds,
        new_paste.max_views,
    )
    .ok_or(ApiError::InvalidTtl)?;

    for attempt in 1..=MAX_KEY_ATTEMPTS {
        let key = paste.key.clone();
        let size = paste.content.len();
        let ttl_seconds = paste.ttl_seconds;
        let max_views = paste.max_views;

        match app.storage.insert_paste(paste) {
            Ok(()) => {
                info!(
                    "new paste: key='{key}', size={size}, ttl_seconds={ttl_seconds:?}, \
                     max_views={max_views:?}"
                );
                let url = paste_url(&app.config.base_url, &key);
                return Ok(CreatedPaste { id: key, url });
            }
            Err(taken) => {
                warn!("key collision on '{key}' (attempt {attempt}), generating a new one");
                paste = taken;
                paste.key = generate_key();
            }
        }
    }

    Err(ApiError::KeyExhausted)
}

/// Fetch a paste, consuming one view.
///
/// A paste past its TTL, or one that has used up all of its views, is deleted
/// here and reported as missing. `now` overrides the app clock.
pub fn fetch_and_decrement(
    app: &App,
    key: &str,
    now: Option<DateTime<Utc>>,
) -> Option<PasteView> {
    let now = now.unwrap_or_else(|| app.clock.now());

    let fetch = app.storage.update_paste(key, |paste| {
        if paste.is_expired_at(now) {
            debug!(
                "paste '{key}' expired after {}ms",
                (now - paste.created_at).num_milliseconds()
            );
            return (Retain::Remove, Fetch::Expired);
        }
        if paste.is_exhausted() {
            return (Retain::Remove, Fetch::Exhausted);
        }

        paste.views += 1;
        (Retain::Keep, Fetch::Served(paste.view()))
    });

    match fetch {
        Some(Fetch::Served(view)) => Some(view),
        Some(Fetch::Expired) => {
            info!("deleted expired paste: {key}");
            None
        }
        Some(Fetch::Exhausted) => {
            info!("deleted paste with no views left: {key}");
            None
        }
        None => None,
    }
}

fn paste_url(base_url: &str, key: &str) -> String {
    format!("{}/p/{key}", base_url.trim_end_matches('/'))
}
