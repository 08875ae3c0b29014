pub const SCHEMA: &str = r#"
-- content table (items are never deleted, only marked stale)
CREATE TABLE IF NOT EXISTS content (
    slug TEXT PRIMARY KEY,
    media_type TEXT,
    platform TEXT,
    series_slug TEXT,
    title TEXT,
    duration_secs INTEGER,
    languages TEXT NOT NULL DEFAULT '[]',
    drm_schemes TEXT NOT NULL DEFAULT '[]',
    available_until TEXT,
    manifest_template TEXT,
    audio_url TEXT,
    season_number INTEGER,
    episode_number INTEGER,
    is_stale INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_content_platform ON content(platform);
CREATE INDEX IF NOT EXISTS idx_content_series_slug ON content(series_slug);

-- restrictions table (current record, one per item; verdict NULL = never classified)
CREATE TABLE IF NOT EXISTS restrictions (
    slug TEXT PRIMARY KEY REFERENCES content(slug),
    verdict TEXT,
    reason TEXT,
    status_code INTEGER,
    last_error TEXT,
    attempt_count INTEGER NOT NULL DEFAULT 0,
    last_checked_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_restrictions_verdict ON restrictions(verdict);

-- check_history table (append-only audit of every attempt)
CREATE TABLE IF NOT EXISTS check_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL REFERENCES content(slug),
    checked_at TEXT NOT NULL,
    verdict TEXT NOT NULL,
    reason TEXT NOT NULL,
    status_code INTEGER,
    error TEXT,
    accepted INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_check_history_slug ON check_history(slug);
"#;
