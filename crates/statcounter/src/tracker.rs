// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Embeddable tracker markup and public stats links.

use std::fmt;

/// The StatCounter counter script plus its `<noscript>` image fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSnippet {
	pub project_id: String,
	pub security_code: String,
	pub https: bool,
	pub visible: bool,
}

impl TrackerSnippet {
	pub fn render(&self) -> String {
		let invisible = if self.visible { 0 } else { 1 };
		let https = if self.https { 1 } else { 0 };
		let scheme = if self.https { "https" } else { "http" };
		format!(
			r#"<script type="text/javascript">
var sc_project={pid};
var sc_invisible={invisible};
var sc_security="{security}";
var sc_https={https};
var scJsHost = (("https:" == document.location.protocol) ?
"https://secure." : "http://www.");
document.write("<sc"+"ript type='text/javascript' src='" +
scJsHost+
"statcounter.com/counter/counter.js'></"+"script>");
</script>
<noscript><div class="statcounter"><a title="hits counter"
href="{scheme}://statcounter.com/" target="_blank"><img
class="statcounter"
src="{scheme}://c.statcounter.com/{pid}/0/{security}/{invisible}/"
alt="hits counter"></a></div></noscript>"#,
			pid = self.project_id,
			security = self.security_code,
		)
	}
}

impl fmt::Display for TrackerSnippet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.render())
	}
}

/// Guest link to a project's public stats page.
pub fn public_stats_url(project_id: &str) -> String {
	format!("http://statcounter.com/p{project_id}?guest=1")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn snippet(https: bool, visible: bool) -> TrackerSnippet {
		TrackerSnippet {
			project_id: "9917949".to_string(),
			security_code: "d420b3cd".to_string(),
			https,
			visible,
		}
	}

	#[test]
	fn invisible_http_tracker() {
		let html = snippet(false, false).render();
		assert!(html.contains("var sc_project=9917949;"));
		assert!(html.contains("var sc_invisible=1;"));
		assert!(html.contains("var sc_security=\"d420b3cd\";"));
		assert!(html.contains("var sc_https=0;"));
		assert!(html.contains("src=\"http://c.statcounter.com/9917949/0/d420b3cd/1/\""));
	}

	#[test]
	fn visible_https_tracker() {
		let html = snippet(true, true).to_string();
		assert!(html.contains("var sc_invisible=0;"));
		assert!(html.contains("var sc_https=1;"));
		assert!(html.contains("https://c.statcounter.com/9917949/0/d420b3cd/0/"));
	}

	#[test]
	fn public_url_format() {
		assert_eq!(
			public_stats_url("9917949"),
			"http://statcounter.com/p9917949?guest=1"
		);
	}
}
