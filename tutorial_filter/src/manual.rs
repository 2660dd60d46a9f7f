/*!

This is the long-form manual for `tutorial_filter` and `mkhandout`.

## What the filter does

learnr tutorials are R Markdown documents whose code chunks carry extra
attributes (`exercise = TRUE`) and whose labels follow naming conventions
(`-solution`, `-code-check`, `-hint`, `-hint-1` ...) that only make sense
inside the interactive tutorial runtime. A handout is the same document with
all of that removed:

* chunks labeled `<label>-solution`, `<label>-code-check`, `<label>-hint`
  or `<label>-hint-<n>` are dropped entirely, fences included;
* chunks carrying `remove_for_md=TRUE` are dropped the same way;
* chunks carrying `exercise = TRUE` are kept, with only that attribute
  deleted from the fence line;
* the leading metadata block is replaced by a fixed header that renders the
  document as a `github_document` with a table of contents.

Everything else passes through byte for byte.

## The `keep_output` option

By default the handout keeps figures (written to `img/`) and textual chunk
results. Declaring `keep_output: false` in the tutorial's metadata block, or
setting it in the batch configuration, switches the header to chunk options
that hide both.

## Command line usage

Convert a single tutorial:

```bash
mkhandout -i inst/tutorials/intro/intro.Rmd -o handouts/intro.Rmd
```

Convert every tutorial below a directory:

```bash
mkhandout --input-dir inst/tutorials --output-dir handouts
```

After writing each handout, `mkhandout` calls `Rscript` to render it with
`rmarkdown::github_document(toc=T, html_preview=F)`. Pass `--no-render` to
skip that step (for instance when R is not installed).

## Batch configuration

For repeated runs, a JSON configuration describes the whole batch:

```json
{
  "outputSettings": {
    "outputDirectory": "handouts",
    "renderDocuments": true,
    "keepOutput": false
  },
  "tutorials": [
    { "filePath": "inst/tutorials/intro/intro.Rmd" },
    { "filePath": "inst/tutorials/wrangling/wrangling.Rmd",
      "title": "Data wrangling (handout)",
      "keepOutput": true }
  ]
}
```

Relative `filePath` entries are resolved against the directory containing
the configuration file. Per-tutorial `title` and `keepOutput` values
override both the configuration defaults and whatever the document itself
declares.

*/
