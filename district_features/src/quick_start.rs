/*!

# Quick start

This example builds the feature file of the house elections from scratch.

Create the data directory and run all the stages:

```bash
mkdir data
elexprep --data-dir data/
```

The first run downloads the census tables, the historical house results and
the exit polls. Some sources cannot be downloaded automatically; the program
prints what to do for them:

```text
[2022-11-05T10:12:01Z ERROR elexprep::pipeline::fetch] check_manual: don't know how to download 2012-precinct-president.csv
[2022-11-05T10:12:01Z INFO  elexprep::pipeline::fetch] check_manual:   no public source of the 2012 presidential results by district
[2022-11-05T10:12:01Z INFO  elexprep::pipeline::fetch] check_manual:   please use R to get them
[2022-11-05T10:12:03Z INFO  elexprep::pipeline::fetch] fetch_paced: 2020-house-pages/alabama.html (1/51)
```

The 2020 house results are read from `2020-house.csv`. The results pages
are cached in `data/2020-house-pages/`; extract the following columns from them:

```text
district-name,district,dem-candidate,gop-candidate,dem-num,gop-num,dem-pct,gop-pct
Massachusetts's 1st district,MA-01,Richard Neal*,,0,0,0,0
```

A `*` marks the declared winner.

Then run again. Everything already downloaded is kept:

```bash
elexprep --data-dir data/ --stage join
```

The output is in `data/features_house.csv`:

```text
year,state,district,dem,rep,tot,incumbent,prevparty,pop,vote_age_pop,male,...
2012,AK,1,82927,185296,289804,1,r,731449,...
```

It is the end of this quick start. You can explore the following sections:
- the list of files and of the fields in the [manual](../manual/index.html).
- the `--verbose` flag to see which districts or poll answers were dropped.

*/
