// Décodage vidéo via ffmpeg en subprocess (std::process::Command), sans binding C.
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans le PATH.
//
// Architecture :
//   - `probe_video`       : interroge ffprobe pour obtenir width/height/fps
//   - `decode_size`       : taille de décodage bornée, aspect préservé
//   - `spawn_ffmpeg_pipe` : lance ffmpeg → flux raw RGBA sur stdout, une frame par tick
//   - `VideoSource`       : lit les frames du pipe, implémente `Source`

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use ap_core::error::PlayerError;
use ap_core::frame::Bitmap;
use ap_core::traits::Source;

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Images par seconde natives (ex: 23.976, 24.0, 30.0, 60.0).
    pub fps: f64,
}

/// Parse la sortie `default=noprint_wrappers=1` de ffprobe.
///
/// Retourne `None` si width ou height manquent ou valent 0.
///
/// # Example
/// ```
/// use ap_source::video::parse_probe_output;
/// let info = parse_probe_output("width=1280\nheight=720\nr_frame_rate=30000/1001\n").unwrap();
/// assert_eq!((info.width, info.height), (1280, 720));
/// assert!((info.fps - 29.97).abs() < 0.01);
/// ```
#[must_use]
pub fn parse_probe_output(text: &str) -> Option<VideoInfo> {
    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;
    let mut fps: f64 = 30.0;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // Format: "24/1" ou "30000/1001"
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 && num > 0.0 {
                fps = num / den;
            }
        }
    }

    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some(VideoInfo {
            width: w,
            height: h,
            fps,
        }),
        _ => None,
    }
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// [`PlayerError::InputUnavailable`] si le fichier n'existe pas,
/// [`PlayerError::DecodeCorrupt`] si ffprobe est introuvable ou ne trouve
/// aucun flux vidéo.
pub fn probe_video(path: &Path) -> Result<VideoInfo, PlayerError> {
    if !path.is_file() {
        return Err(PlayerError::InputUnavailable {
            path: path.display().to_string(),
        });
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
        ])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| {
            PlayerError::DecodeCorrupt(format!(
                "impossible de lancer ffprobe ({e}). Vérifiez qu'il est installé et dans le PATH."
            ))
        })?;

    let text = String::from_utf8_lossy(&output.stdout);
    let info = parse_probe_output(&text).ok_or_else(|| {
        PlayerError::DecodeCorrupt(format!(
            "ffprobe n'a trouvé aucun flux vidéo dans {}",
            path.display()
        ))
    })?;

    log::info!(
        "probe_video: {}x{} @ {:.3}fps, {}",
        info.width,
        info.height,
        info.fps,
        path.display()
    );
    Ok(info)
}

/// Taille de décodage : la taille native réduite pour tenir dans `max`,
/// aspect préservé, jamais agrandie, au moins 1×1.
///
/// # Example
/// ```
/// use ap_source::video::decode_size;
/// assert_eq!(decode_size((1920, 1080), (640, 360)), (640, 360));
/// assert_eq!(decode_size((1080, 1920), (640, 360)), (203, 360));
/// assert_eq!(decode_size((320, 240), (640, 360)), (320, 240));
/// ```
#[must_use]
pub fn decode_size(native: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (w, h) = native;
    let (max_w, max_h) = (max.0.max(1), max.1.max(1));
    if w <= max_w && h <= max_h {
        return (w.max(1), h.max(1));
    }
    let scale = (f64::from(max_w) / f64::from(w)).min(f64::from(max_h) / f64::from(h));
    let sw = (f64::from(w) * scale).round() as u32;
    let sh = (f64::from(h) * scale).round() as u32;
    (sw.clamp(1, max_w), sh.clamp(1, max_h))
}

/// Lance un processus `ffmpeg` qui écrit des frames RGBA brutes sur stdout.
///
/// Chaque frame = `w × h × 4` bytes (RGBA row-major, sans padding).
/// `-r` fixe la cadence de sortie : une frame par tick de lecture.
/// `-an` supprime l'audio.
///
/// # Errors
/// [`PlayerError::DecodeCorrupt`] si ffmpeg ne peut pas être lancé.
pub fn spawn_ffmpeg_pipe(path: &Path, w: u32, h: u32, target_fps: u32) -> Result<Child, PlayerError> {
    let scale_filter = format!("scale={w}:{h}:flags=bilinear");
    let fps_str = target_fps.to_string();

    let child = Command::new("ffmpeg")
        .arg("-i")
        .arg(path) // fichier source
        .args([
            "-vf",
            &scale_filter, // scale + filter
            "-f",
            "rawvideo", // format raw
            "-pix_fmt",
            "rgba", // RGBA 4 bytes/pixel
            "-r",
            &fps_str, // fps output
            "-an",    // pas d'audio dans ce pipe
            "-hide_banner",
            "-loglevel",
            "error",
            "pipe:1", // stdout
        ])
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| PlayerError::DecodeCorrupt(format!("impossible de lancer ffmpeg : {e}")))?;

    log::debug!("ffmpeg spawné: {w}x{h} @ {target_fps}fps, {}", path.display());
    Ok(child)
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// Retourne le nombre de bytes lus : `buf.len()` si complet, moins sur EOF.
///
/// # Errors
/// Erreur I/O fatale (hors `Interrupted`).
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break, // EOF
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

/// Lit une frame brute de `len` bytes.
///
/// `Ok(None)` sur EOF propre, entre deux frames.
///
/// # Errors
/// [`PlayerError::DecodeCorrupt`] si le pipe échoue ou si le flux s'arrête
/// au milieu d'une frame.
pub fn read_frame<R: Read>(reader: &mut R, len: usize) -> Result<Option<Vec<u8>>, PlayerError> {
    let mut data = vec![0u8; len];
    let read = read_exact_or_eof(reader, &mut data)
        .map_err(|e| PlayerError::DecodeCorrupt(format!("lecture du pipe ffmpeg : {e}")))?;
    match read {
        0 => Ok(None),
        n if n == len => Ok(Some(data)),
        n => Err(PlayerError::DecodeCorrupt(format!(
            "frame tronquée ({n}/{len} bytes)"
        ))),
    }
}

/// Flux vidéo décodé par ffmpeg, une frame RGBA par appel.
///
/// Le processus ffmpeg est tué et récupéré au `Drop`.
pub struct VideoSource {
    path: PathBuf,
    child: Child,
    stdout: Option<ChildStdout>,
    info: VideoInfo,
    width: u32,
    height: u32,
    frames_read: u64,
}

impl VideoSource {
    /// Probe `path`, then start ffmpeg at `target_fps` with frames bounded by `max`.
    ///
    /// # Errors
    /// See [`probe_video`] and [`spawn_ffmpeg_pipe`].
    pub fn open(path: &Path, target_fps: u32, max: (u32, u32)) -> Result<Self, PlayerError> {
        let info = probe_video(path)?;
        let (width, height) = decode_size((info.width, info.height), max);
        let mut child = spawn_ffmpeg_pipe(path, width, height, target_fps.max(1))?;
        let stdout = child.stdout.take();
        Ok(Self {
            path: path.to_path_buf(),
            child,
            stdout,
            info,
            width,
            height,
            frames_read: 0,
        })
    }

    /// Métadonnées ffprobe.
    #[must_use]
    pub fn info(&self) -> VideoInfo {
        self.info
    }

    /// Taille des bitmaps produits.
    #[must_use]
    pub fn decode_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// EOF reached: reap ffmpeg and turn a failed exit into an error.
    fn finish(&mut self) -> Result<Option<Bitmap>, PlayerError> {
        self.stdout = None;
        let status = self
            .child
            .wait()
            .map_err(|e| PlayerError::DecodeCorrupt(format!("attente ffmpeg : {e}")))?;
        if status.success() {
            log::info!(
                "Vidéo: EOF après {} frames, {}",
                self.frames_read,
                self.path.display()
            );
            Ok(None)
        } else {
            Err(PlayerError::DecodeCorrupt(format!(
                "ffmpeg a échoué ({status}) sur {}",
                self.path.display()
            )))
        }
    }
}

impl Source for VideoSource {
    fn next_bitmap(&mut self) -> Result<Option<Bitmap>, PlayerError> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };
        let frame_bytes = self.width as usize * self.height as usize * 4;
        match read_frame(stdout, frame_bytes) {
            Ok(Some(data)) => {
                self.frames_read += 1;
                Bitmap::from_rgba(self.width, self.height, data).map(Some)
            }
            Ok(None) => self.finish(),
            Err(e) => {
                log::warn!("Vidéo: {e} après {} frames", self.frames_read);
                self.stdout = None;
                Err(e)
            }
        }
    }

    fn native_size(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        self.stdout = None;
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}
