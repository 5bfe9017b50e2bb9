//! Built-in site overrides, keyed by normalized host.
//!
//! Each entry is written in the same directive format as a custom override
//! file so that both go through [`ConfigParser`](super::ConfigParser).

pub(crate) static BUILTIN_OVERRIDES: &[(&str, &str)] = &[
    (
        "amd.com",
        "http_header(Accept-Language): en-US,en;q=0.5
         http_header(Accept-Encoding): gzip
         http_header(Cookie):",
    ),
    (
        "arxiv.org",
        r"url_pattern: /pdf/(?P<id>.+?)(?:\.pdf)?$
          url_replacement: /abs/${id}",
    ),
    (
        "bloomberg.com",
        "http_header(Referer): https://google.com/
         http_header(DNT): 1",
    ),
    ("cbc.ca", "title_selector: meta_property(og:title)"),
    (
        "cell.com",
        r"url_pattern: cell\.com/(?P<path>.+?)/pdf(?:Extended)*/(?P<id>.+?)(?:\.pdf)?$
          url_replacement: cell.com/${path}/fulltext/${id}
          url_pattern: cell\.com/action/showPdf\?pii=(?P<id>.+)$
          url_replacement: cell.com/cell/fulltext/${id}",
    ),
    (
        "citeseerx.ist.psu.edu",
        r"url_pattern: /viewdoc/download\?doi=(?P<doi>.+?)&.+$
          url_replacement: /viewdoc/summary?doi=${doi}",
    ),
    (
        "colab.research.google.com",
        r"url_pattern: //colab\.research\.google\.com/drive/(?P<id>[\w\-]+)(?:#.*)?$
          url_replacement: //drive.google.com/file/d/${id}
          url_pattern: //colab\.research\.google\.com/github/(?P<repo>\w+/\w+)/blob/(?P<file>[^#]*?\.ipynb)(?:#.*)?$
          url_replacement: //raw.githubusercontent.com/${repo}/${file}
          title_pattern: (?P<name>.+?) - Google Drive$
          title_replacement: ${name} - Colaboratory",
    ),
    (
        "docs.aws.amazon.com",
        r#"title_selector: text(.topictitle) + " - " + meta_name(product)"#,
    ),
    ("dolthub.com", "http_header(Accept-Encoding): gzip"),
    (
        "eudl.eu",
        r"url_pattern: /pdf/(?P<id>.+?)$
          url_replacement: /doi/${id}",
    ),
    ("fresnobee.com", "http_header(Accept-Encoding): gzip"),
    (
        "ft.com",
        "user_agent: Mozilla/5.0 (compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm)",
    ),
    (
        "gastrojournal.org",
        r"url_pattern: gastrojournal\.org/article/(?P<id>.+?)/pdf$
          url_replacement: gastrojournal.org/article/${id}/",
    ),
    (
        "iopscience.iop.org",
        r"url_pattern: iopscience\.iop\.org/article/(?P<id>.+?)/pdf$
          url_replacement: iopscience.iop.org/article/${id}",
    ),
    ("jstor.org", "user_agent: Mozilla/5.0"),
    (
        "m.slashdot.org",
        r"url_pattern: m\.slashdot\.org/(?P<path>.+)$
          url_replacement: slashdot.org/${path}/",
    ),
    (
        "m.youtube.com",
        "user_agent: Mozilla/5.0
         retry_title: ^YouTube$",
    ),
    ("medscape.com", "user_agent: Googlebot-News"),
    ("miamiherald.com", "http_header(Accept-Encoding): gzip"),
    (
        "mobile.twitter.com",
        r"url_pattern: ^https?://mobile\.twitter\.com/
          url_replacement: https://twitter.com/",
    ),
    (
        "money.usnews.com",
        "http_header(Cookie):
         http_header(Accept-Language): en-US,en;q=0.5",
    ),
    ("nationalgeographic.com", "user_agent: Googlebot-News"),
    (
        "nature.com",
        r"url_pattern: nature\.com/articles/(?P<id>.+?)\.pdf$
          url_replacement: nature.com/articles/${id}",
    ),
    (
        "ncbi.nlm.nih.gov",
        r"url_pattern: /pmc/articles/PMC(?P<id>.+?)/pdf/?(?:.+?\.pdf)?$
          url_replacement: /pmc/articles/PMC${id}/",
    ),
    ("omicsonline.org", "webcache: yes"),
    (
        "onlinelibrary.wiley.com",
        r"url_pattern: onlinelibrary\.wiley\.com/doi/(?P<doi>.+?)/pdf$
          url_replacement: onlinelibrary.wiley.com/doi/${doi}
          url_pattern: onlinelibrary\.wiley\.com/doi/pdf/(?P<doi>.+)$
          url_replacement: onlinelibrary.wiley.com/doi/${doi}",
    ),
    ("outline.com", "user_agent: Googlebot-News"),
    (
        "pdfs.semanticscholar.org",
        r"url_pattern: //pdfs\.semanticscholar\.org/(?P<id1>.+?)/(?P<id2>.+?)\.pdf$
          url_replacement: //semanticscholar.org/paper/${id1}${id2}",
    ),
    (
        "pubs.acs.org",
        r"url_pattern: ^https://(?P<url>.+)$
          url_replacement: http://${url}",
    ),
    (
        "researchgate.net",
        r"url_pattern: researchgate\.net/profile/(?P<author>.+?)/publication/(?P<pub>.+?)/links/.+?\.pdf$
          url_replacement: researchgate.net/profile/${author}/publication/${pub}",
    ),
    (
        "seekingalpha.com",
        "http_header(Host): seekingalpha.com
         http_header(Referer): https://google.com/
         http_header(DNT): 1",
    ),
    (
        "swansonvitamins.com",
        "user_agent: FeedFetcher-Google; (+http://www.google.com/feedfetcher.html)",
    ),
    ("t.co", "substitute_url_with_title: yes"),
    (
        "trends.google.com",
        r"user_agent: soup - Google Trends
          url_pattern: ^https://(?P<url>.+)$
          url_replacement: http://${url}",
    ),
    ("twitter.com", "user_agent: Googlebot-News"),
    (
        "usnews.com",
        "user_agent: FeedFetcher-Google; (+http://www.google.com/feedfetcher.html)",
    ),
    (
        "youtu.be",
        "user_agent: Mozilla/5.0
         retry_title: ^YouTube$",
    ),
    (
        "youtube.com",
        "user_agent: Mozilla/5.0
         retry_title: ^YouTube$",
    ),
];
