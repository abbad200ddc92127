// file: src/server/page.rs
// description: single page query form served at /

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Hierarchical Q&amp;A System</title>
<style>
  body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; max-width: 760px; margin: 2rem auto; padding: 0 1rem; color: #262730; }
  h1 { font-size: 2.2rem; margin-bottom: 0.25rem; }
  label { display: block; margin: 1.5rem 0 0.4rem; font-size: 0.9rem; }
  input[type=text] { width: 100%; box-sizing: border-box; padding: 0.6rem; font-size: 1rem; border: 1px solid #d0d0d8; border-radius: 6px; }
  button { margin-top: 0.8rem; padding: 0.5rem 1rem; font-size: 1rem; border: 1px solid #d0d0d8; border-radius: 6px; background: #fff; cursor: pointer; }
  button:disabled { opacity: 0.5; cursor: progress; }
  #spinner { display: none; margin-top: 1rem; color: #555; }
  #error { color: #b00020; margin-top: 1rem; }
  .chunk { white-space: pre-wrap; }
  hr { border: none; border-top: 1px solid #e6e6ea; margin: 1rem 0; }
</style>
</head>
<body>
<h1>Hierarchical Q&amp;A System</h1>
<p>Ask a question and retrieve relevant information from the document.</p>

<form id="query-form">
  <label for="query">Enter your query:</label>
  <input id="query" type="text" autocomplete="off" placeholder="e.g., How does the Quicksort algorithm work?">
  <button id="submit" type="submit">Get Answer</button>
</form>

<div id="spinner">Retrieving the answer using hierarchical indexing...</div>
<div id="error"></div>
<div id="answer"></div>
<div id="history"></div>

<script>
const PREVIEW_CHARS = 300;

function el(tag, text, className) {
  const node = document.createElement(tag);
  if (text !== undefined) node.textContent = text;
  if (className) node.className = className;
  return node;
}

function renderResponse(entry) {
  const block = el("div");
  const heading = el("p");
  heading.append("Results for: ", el("strong", entry.query));
  block.append(heading);
  for (const chunk of entry.results) {
    block.append(el("p", "Page " + chunk.page, null));
    block.lastChild.style.fontWeight = "bold";
    block.append(el("p", Array.from(chunk.content).slice(0, PREVIEW_CHARS).join(""), "chunk"));
    block.append(el("hr"));
  }
  return block;
}

async function loadHistory() {
  const container = document.getElementById("history");
  container.replaceChildren();
  const response = await fetch("/api/history");
  if (!response.ok) return;
  const body = await response.json();
  for (const entry of body.entries) {
    const user = el("p");
    user.append(el("strong", "User:"), " " + entry.query);
    container.append(user, renderResponse(entry));
  }
}

document.getElementById("query-form").addEventListener("submit", async (event) => {
  event.preventDefault();
  const query = document.getElementById("query").value;
  if (!query.trim()) return;

  const button = document.getElementById("submit");
  const spinner = document.getElementById("spinner");
  const error = document.getElementById("error");
  const answer = document.getElementById("answer");

  button.disabled = true;
  spinner.style.display = "block";
  error.textContent = "";

  try {
    const response = await fetch("/api/query", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({ query }),
    });
    const body = await response.json();
    if (!response.ok) {
      error.textContent = body.message || "Request failed";
      return;
    }
    answer.replaceChildren(renderResponse(body));
    await loadHistory();
  } catch (e) {
    error.textContent = String(e);
  } finally {
    button.disabled = false;
    spinner.style.display = "none";
  }
});

loadHistory();
</script>
</body>
</html>
"#;
