//! Landing page

use crate::core::{format_duration, CompletedDownload, Task};
use std::fmt::Write;
use std::time::Duration;

const SCRIPT: &str = r#"
const form = document.getElementById('url-form');
const select = document.getElementById('format');
const state = document.getElementById('state');

form.addEventListener('submit', async (event) => {
  event.preventDefault();
  const url = document.getElementById('url').value;
  state.textContent = 'Loading formats...';
  const body = await (await fetch('/formats?url=' + encodeURIComponent(url))).json();
  if (body.error) { state.textContent = body.error; return; }
  select.innerHTML = '';
  for (const f of body.formats) {
    const option = document.createElement('option');
    option.value = f.format_id;
    option.textContent = `${f.resolution} ${f.ext} ${f.format_note} (${f.filesize_str})`;
    select.appendChild(option);
  }
  document.getElementById('picker').hidden = false;
  state.textContent = body.title;
});

document.getElementById('start').addEventListener('click', async () => {
  const url = document.getElementById('url').value;
  const query = 'url=' + encodeURIComponent(url) + '&format_id=' + encodeURIComponent(select.value);
  const { task_id } = await (await fetch('/download?' + query, { method: 'POST' })).json();
  const timer = setInterval(async () => {
    const task = await (await fetch('/status/' + task_id)).json();
    if (task.status === 'downloading') {
      state.textContent = `Downloading... ${task.progress}%`;
    } else {
      clearInterval(timer);
      if (task.status === 'completed') { location.reload(); }
      else { state.textContent = task.error || task.status; }
    }
  }, 1000);
});
"#;

/// Escape text for HTML bodies and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn duration_label(seconds: Option<f64>) -> String {
    seconds
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
        .map(format_duration)
        .unwrap_or_else(|| "unknown length".to_string())
}

fn render_video(out: &mut String, video: &CompletedDownload) {
    let _ = write!(
        out,
        r#"<article class="video">
<h3>{title}</h3>
<p class="meta">{uploader} &middot; {duration}</p>
<video controls preload="metadata" src="{path}" type="{mime}"></video>
<p class="description">{description}</p>
<a href="{path}" download>{filename}</a>
</article>
"#,
        title = escape_html(&video.title),
        uploader = escape_html(video.uploader.as_deref().unwrap_or("Unknown uploader")),
        duration = duration_label(video.duration),
        path = escape_html(&video.file_path),
        mime = escape_html(&video.mime_type),
        description = escape_html(&video.description),
        filename = escape_html(&video.filename),
    );
}

/// Render the page listing completed downloads
pub fn render_index(tasks: &[Task]) -> String {
    let mut videos = String::new();
    for video in tasks.iter().filter_map(|t| t.download.as_ref()) {
        render_video(&mut videos, video);
    }
    if videos.is_empty() {
        videos.push_str("<p>No downloads yet.</p>\n");
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>tubedrop</title>
<style>
body {{ font-family: sans-serif; max-width: 960px; margin: 2rem auto; }}
video {{ width: 100%; max-height: 480px; }}
.meta {{ color: #666; }}
</style>
</head>
<body>
<h1>tubedrop</h1>
<form id="url-form">
<input id="url" type="url" placeholder="Video URL" size="60" required>
<button type="submit">Get formats</button>
</form>
<div id="picker" hidden>
<select id="format"></select>
<button id="start" type="button">Download</button>
</div>
<p id="state"></p>
<h2>Downloads</h2>
{videos}<script>{script}</script>
</body>
</html>
"#,
        videos = videos,
        script = SCRIPT,
    )
}
