//! Annotator state and event loop.
//!
//! This module coordinates the interactive labeling session: which audio
//! file and segment are selected, which class checkboxes are set, and when
//! the store is written. Every checkbox toggle saves immediately, so the
//! backing file always reflects what is on screen. Playback completion is
//! observed cooperatively from the loop tick.

use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::info;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    error::Error,
    io,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use segmark::config::Config;
use segmark::media;
use segmark::segment::{self, SegmentSpan};
use segmark::store::{AnnotationRecord, AnnotationStore};
use segmark::utils::scan;

use super::audio::Playback;
use super::ui;

const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Focus {
    AudioList,
    SegmentList,
}

pub struct App {
    pub should_quit: bool,
    pub audio_files: Vec<PathBuf>,
    pub selected_audio: Option<usize>,
    pub segments: Vec<SegmentSpan>,
    pub selected_segment: Option<usize>,
    pub checked: Vec<bool>,
    pub focus: Focus,
    pub is_playing: bool,
    pub config: Config,
    pub store: AnnotationStore,
    pub status_message: Option<String>,
    status_message_at: Option<Instant>,
    playback: Option<Playback>,
}

impl App {
    pub fn new(folder: &Path, config: Config, store: AnnotationStore) -> Result<Self, Box<dyn Error>> {
        // Canonicalize so stored file locations are absolute regardless of
        // how the folder argument was spelled
        let folder = std::fs::canonicalize(folder).unwrap_or_else(|_| folder.to_path_buf());
        let audio_files = scan::collect_audio_files(&folder)?;
        let checked = vec![false; config.classes.len()];

        let mut app = Self {
            should_quit: false,
            audio_files,
            selected_audio: None,
            segments: Vec::new(),
            selected_segment: None,
            checked,
            focus: Focus::AudioList,
            is_playing: false,
            config,
            store,
            status_message: None,
            status_message_at: None,
            playback: None,
        };

        if app.audio_files.is_empty() {
            app.set_status("No WAV or FLAC files in this folder".to_string());
        } else {
            app.select_audio(0);
        }
        Ok(app)
    }

    /// Display name of the selected audio file.
    pub fn audio_name(&self) -> Option<String> {
        let index = self.selected_audio?;
        self.audio_files[index]
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
    }

    pub fn current_span(&self) -> Option<SegmentSpan> {
        self.selected_segment.map(|i| self.segments[i])
    }

    /// Labeling progress through the selected file, 0.0 to 1.0.
    pub fn progress(&self) -> f64 {
        match self.selected_segment {
            Some(i) if !self.segments.is_empty() => (i + 1) as f64 / self.segments.len() as f64,
            _ => 0.0,
        }
    }

    pub fn select_audio(&mut self, index: usize) {
        if index >= self.audio_files.len() {
            return;
        }
        self.stop_playback();
        self.selected_audio = Some(index);

        match media::probe(&self.audio_files[index]) {
            Ok(meta) => {
                self.segments = segment::compute_segments(meta.duration_ms, self.config.window_ms);
                self.selected_segment = if self.segments.is_empty() { None } else { Some(0) };
            }
            Err(e) => {
                // Decode failures only affect this file; the rest of the
                // folder stays browsable.
                self.segments.clear();
                self.selected_segment = None;
                self.set_status(format!("Cannot decode: {e}"));
            }
        }
        self.load_existing_annotation();
    }

    pub fn select_segment(&mut self, index: usize) {
        if index >= self.segments.len() {
            return;
        }
        self.stop_playback();
        self.selected_segment = Some(index);
        self.load_existing_annotation();
    }

    pub fn next_segment(&mut self) {
        if let Some(current) = self.selected_segment
            && current + 1 < self.segments.len()
        {
            self.select_segment(current + 1);
        }
    }

    pub fn prev_segment(&mut self) {
        if let Some(current) = self.selected_segment
            && current > 0
        {
            self.select_segment(current - 1);
        }
    }

    pub fn next_audio(&mut self) {
        if let Some(current) = self.selected_audio
            && current + 1 < self.audio_files.len()
        {
            self.select_audio(current + 1);
        }
    }

    pub fn prev_audio(&mut self) {
        if let Some(current) = self.selected_audio
            && current > 0
        {
            self.select_audio(current - 1);
        }
    }

    /// Toggle class `class_index` for the selected segment and save.
    ///
    /// Deselecting the last class still saves: the row keeps existing with
    /// empty label lists, and the file stays marked as annotated.
    pub fn toggle_class(&mut self, class_index: usize) {
        if class_index >= self.checked.len() {
            return;
        }
        if self.selected_audio.is_none() || self.selected_segment.is_none() {
            return;
        }
        self.checked[class_index] = !self.checked[class_index];
        self.save_current_annotation();
    }

    fn save_current_annotation(&mut self) {
        let (Some(audio_index), Some(segment_index)) = (self.selected_audio, self.selected_segment)
        else {
            return;
        };
        let Some(audio_name) = self.audio_name() else {
            return;
        };
        let span = self.segments[segment_index];

        let class_ids: Vec<u32> = self
            .checked
            .iter()
            .enumerate()
            .filter(|(_, checked)| **checked)
            .map(|(i, _)| i as u32)
            .collect();
        let class_names: Vec<String> = class_ids
            .iter()
            .map(|&id| self.config.classes[id as usize].clone())
            .collect();

        let record = AnnotationRecord {
            audio_name,
            file_location: self.audio_files[audio_index].display().to_string(),
            segment_number: segment_index as u32,
            segment_time: span.time_label(),
            class_ids,
            class_names,
        };

        if let Err(e) = self.store.upsert(record) {
            // The table was rolled back; the user can toggle again to retry.
            log::error!("Failed to save annotation: {e}");
            self.set_status(format!("Save failed: {e}"));
        }
    }

    fn load_existing_annotation(&mut self) {
        self.checked = vec![false; self.config.classes.len()];

        let Some(segment_index) = self.selected_segment else {
            return;
        };
        let Some(audio_name) = self.audio_name() else {
            return;
        };

        if let Some(record) = self.store.get(&audio_name, segment_index as u32) {
            for id in &record.class_ids {
                if let Some(checked) = self.checked.get_mut(*id as usize) {
                    *checked = true;
                }
            }
        }
    }

    pub fn toggle_playback(&mut self) {
        if self.is_playing {
            self.stop_playback();
        } else {
            self.start_playback();
        }
    }

    fn start_playback(&mut self) {
        let (Some(audio_index), Some(span)) = (self.selected_audio, self.current_span()) else {
            return;
        };

        if self.playback.is_none() {
            match Playback::new() {
                Ok(playback) => self.playback = Some(playback),
                Err(e) => {
                    self.set_status(format!("Audio device unavailable: {e}"));
                    return;
                }
            }
        }

        let path = self.audio_files[audio_index].clone();
        if let Some(playback) = &mut self.playback {
            match playback.play_range(&path, span.start_ms, span.end_ms) {
                Ok(()) => self.is_playing = true,
                Err(e) => self.set_status(format!("Playback failed: {e}")),
            }
        }
    }

    pub fn stop_playback(&mut self) {
        if let Some(playback) = &self.playback {
            playback.stop();
        }
        self.is_playing = false;
    }

    /// Cooperative completion check, driven from the event loop tick.
    pub fn poll_playback(&mut self) {
        if self.is_playing
            && self.playback.as_ref().is_some_and(|p| p.is_finished())
        {
            self.is_playing = false;
        }
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_message_at = Some(Instant::now());
    }

    pub fn tick_status(&mut self) {
        if let Some(at) = self.status_message_at
            && at.elapsed() > STATUS_MESSAGE_TTL
        {
            self.status_message = None;
            self.status_message_at = None;
        }
    }
}

pub fn run(folder: &str, config: Config, store: AnnotationStore) -> Result<(), Box<dyn Error>> {
    init_logging()?;
    info!("Starting segmark annotator in {folder}");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = match App::new(Path::new(folder), config, store) {
        Ok(app) => app,
        Err(e) => {
            // Clean up terminal before showing error
            disable_raw_mode()?;
            execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
            terminal.show_cursor()?;
            return Err(e);
        }
    };

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = res {
        eprintln!("Error: {e}");
        return Err(e);
    }
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    loop {
        app.poll_playback();
        app.tick_status();

        terminal.draw(|f| ui::draw(f, app))?;

        // Poll with a short timeout so playback completion and status
        // expiry are observed without user input
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
        {
            handle_key_event(app, key);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key_event(app: &mut App, key: event::KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.stop_playback();
            app.should_quit = true;
        }
        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::AudioList => Focus::SegmentList,
                Focus::SegmentList => Focus::AudioList,
            };
        }
        KeyCode::Up => match app.focus {
            Focus::AudioList => app.prev_audio(),
            Focus::SegmentList => app.prev_segment(),
        },
        KeyCode::Down => match app.focus {
            Focus::AudioList => app.next_audio(),
            Focus::SegmentList => app.next_segment(),
        },
        KeyCode::Left => app.prev_segment(),
        KeyCode::Right => app.next_segment(),
        KeyCode::Char(' ') => app.toggle_playback(),
        KeyCode::Char(c @ '1'..='9') => {
            app.toggle_class(c as usize - '1' as usize);
        }
        _ => {}
    }
}

fn init_logging() -> Result<(), Box<dyn Error>> {
    use simplelog::{CombinedLogger, LevelFilter, WriteLogger};
    use std::fs::File;

    let log_file = "/tmp/segmark-annotator.log";
    CombinedLogger::init(vec![WriteLogger::new(
        LevelFilter::Info,
        simplelog::Config::default(),
        File::create(log_file)?,
    )])?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(path: &Path, duration_ms: u64) {
        let sample_rate = 8000;
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let frames = duration_ms * sample_rate as u64 / 1000;
        for _ in 0..frames {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn test_app(dir: &TempDir) -> App {
        let store = AnnotationStore::open(&dir.path().join("annotations.csv")).unwrap();
        App::new(dir.path(), Config::new(), store).unwrap()
    }

    #[test]
    fn test_new_app_selects_first_file() {
        let dir = TempDir::new().unwrap();
        write_wav(&dir.path().join("a.wav"), 12_000);
        write_wav(&dir.path().join("b.wav"), 5000);

        let app = test_app(&dir);

        assert!(!app.should_quit);
        assert_eq!(app.audio_files.len(), 2);
        assert_eq!(app.selected_audio, Some(0));
        assert_eq!(app.audio_name().unwrap(), "a.wav");
        // 12 s at the default 5 s window
        assert_eq!(app.segments.len(), 3);
        assert_eq!(app.selected_segment, Some(0));
        assert!(!app.is_playing);
        assert_eq!(app.focus, Focus::AudioList);
        assert!(app.checked.iter().all(|c| !c));
    }

    #[test]
    fn test_new_app_with_empty_folder() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir);

        assert!(app.audio_files.is_empty());
        assert_eq!(app.selected_audio, None);
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_segment_navigation_stays_in_bounds() {
        let dir = TempDir::new().unwrap();
        write_wav(&dir.path().join("a.wav"), 12_000);

        let mut app = test_app(&dir);
        app.prev_segment();
        assert_eq!(app.selected_segment, Some(0));

        app.next_segment();
        app.next_segment();
        assert_eq!(app.selected_segment, Some(2));
        app.next_segment();
        assert_eq!(app.selected_segment, Some(2));
    }

    #[test]
    fn test_toggle_class_saves_annotation() {
        let dir = TempDir::new().unwrap();
        write_wav(&dir.path().join("a.wav"), 12_000);

        let mut app = test_app(&dir);
        app.toggle_class(0);
        app.toggle_class(2);

        let record = app.store.get("a.wav", 0).unwrap();
        assert_eq!(record.class_ids, vec![0, 2]);
        assert_eq!(record.class_names, vec!["Male", "Engine_rev"]);
        assert_eq!(record.segment_time, "0-5");
        assert!(app.store.is_audio_annotated("a.wav"));
    }

    #[test]
    fn test_deselecting_all_keeps_row() {
        let dir = TempDir::new().unwrap();
        write_wav(&dir.path().join("a.wav"), 12_000);

        let mut app = test_app(&dir);
        app.toggle_class(1);
        app.toggle_class(1);

        let record = app.store.get("a.wav", 0).unwrap();
        assert!(record.class_ids.is_empty());
        assert!(app.store.is_audio_annotated("a.wav"));
    }

    #[test]
    fn test_segment_change_restores_checkboxes() {
        let dir = TempDir::new().unwrap();
        write_wav(&dir.path().join("a.wav"), 12_000);

        let mut app = test_app(&dir);
        app.toggle_class(4);
        assert!(app.checked[4]);

        app.next_segment();
        assert!(app.checked.iter().all(|c| !c));

        app.prev_segment();
        assert!(app.checked[4]);
        assert!(!app.checked[0]);
    }

    #[test]
    fn test_toggle_class_without_selection_does_nothing() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);

        app.toggle_class(0);
        assert!(app.store.is_empty());
    }

    #[test]
    fn test_undecodable_file_sets_warning() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.wav"), b"not audio").unwrap();

        let app = test_app(&dir);
        assert_eq!(app.selected_audio, Some(0));
        assert!(app.segments.is_empty());
        assert_eq!(app.selected_segment, None);
        assert!(app.status_message.as_deref().unwrap().contains("Cannot decode"));
    }

    #[test]
    fn test_progress_through_file() {
        let dir = TempDir::new().unwrap();
        write_wav(&dir.path().join("a.wav"), 10_000);

        let mut app = test_app(&dir);
        assert_eq!(app.progress(), 0.5);
        app.next_segment();
        assert_eq!(app.progress(), 1.0);
    }
}
