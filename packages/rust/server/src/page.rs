//! The search page served at `/`.

/// Search box plus a result frame. The frame follows the input 200ms after
/// the last keystroke, and once on load for browser-restored input.
pub const INDEX_HTML: &str = r##"<!doctype html>
<html>
<head>
	<meta charset="utf-8" />
	<title>quickdoc</title>
	<style>
	body {
		margin: 0;
	}

	#result {
		border: none;
		width: 100vw;
		height: 100vh;
	}
	</style>
</head>

<body>
	<h1>quickdoc</h1>

	<input id="search" type="search" autofocus />
	<hr />

	<iframe id="result" src="/doc"></iframe>

	<script>
		var DEBOUNCE_MS = 200;
		var searchEl = document.querySelector("#search");
		var resultEl = document.querySelector("#result");

		function lookup() {
			resultEl.src = "/doc/" + searchEl.value;
		}

		lookup();

		var timeout = null;
		searchEl.addEventListener("input", function() {
			clearTimeout(timeout);
			timeout = setTimeout(lookup, DEBOUNCE_MS);
		});
	</script>
</body>
</html>
"##;
