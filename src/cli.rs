use bpaf::Bpaf;
use std::path::PathBuf;

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
pub struct Args {
    /// Skip confirmation prompt
    #[bpaf(short, long)]
    pub yes: bool,

    /// Path to config file
    #[bpaf(short, long, fallback(PathBuf::from("vitrine.yaml")))]
    pub config: PathBuf,

    #[bpaf(external)]
    pub command: Command,
}

#[derive(Debug, Clone, Bpaf)]
pub enum Command {
    /// List, add or delete products
    #[bpaf(command)]
    Products {
        #[bpaf(external)]
        product_action: ProductAction,
    },

    /// List, add or delete promotional ads
    #[bpaf(command)]
    Ads {
        #[bpaf(external)]
        ad_action: AdAction,
    },

    /// Show or edit social-media links
    #[bpaf(command)]
    Socials {
        #[bpaf(external)]
        social_action: SocialAction,
    },

    /// Copy, list or clean up media files
    #[bpaf(command)]
    Media {
        #[bpaf(external)]
        media_action: MediaAction,
    },

    /// Show the state of every collection and the media directory
    #[bpaf(command)]
    Status,
}

#[derive(Debug, Clone, Bpaf)]
pub enum ProductAction {
    /// List products
    #[bpaf(command)]
    List,

    /// Add a product
    #[bpaf(command)]
    Add {
        /// Product name
        #[bpaf(argument("NAME"))]
        name: String,

        /// Product description
        #[bpaf(argument("TEXT"))]
        description: String,

        /// Price, a number
        #[bpaf(argument("PRICE"))]
        price: String,

        /// Category, e.g. Perfumes
        #[bpaf(argument("CATEGORY"))]
        category: String,

        /// Image or video to attach, may be repeated
        #[bpaf(argument("FILE"))]
        media: Vec<PathBuf>,
    },

    /// Delete a product by its list position
    #[bpaf(command)]
    Delete {
        /// Also delete the product's media files
        purge_media: bool,

        /// Position shown by `list`, starting at 1
        #[bpaf(positional("INDEX"))]
        index: usize,
    },
}

#[derive(Debug, Clone, Bpaf)]
pub enum AdAction {
    /// List ads
    #[bpaf(command)]
    List,

    /// Add an ad
    #[bpaf(command)]
    Add {
        /// Ad text
        #[bpaf(argument("TEXT"))]
        text: String,

        /// Image or video shown with the ad
        #[bpaf(argument("FILE"))]
        media: PathBuf,
    },

    /// Delete an ad by its list position
    #[bpaf(command)]
    Delete {
        /// Also delete the ad's media file
        purge_media: bool,

        /// Position shown by `list`, starting at 1
        #[bpaf(positional("INDEX"))]
        index: usize,
    },
}

#[derive(Debug, Clone, Bpaf)]
pub enum SocialAction {
    /// Show all social links
    #[bpaf(command)]
    Show,

    /// Add or update a social link
    #[bpaf(command)]
    Set {
        /// Platform key, e.g. instagram
        #[bpaf(positional("KEY"))]
        key: String,

        /// Link URL
        #[bpaf(positional("VALUE"))]
        value: String,
    },

    /// Remove a social link
    #[bpaf(command)]
    Unset {
        /// Platform key
        #[bpaf(positional("KEY"))]
        key: String,
    },
}

#[derive(Debug, Clone, Bpaf)]
pub enum MediaAction {
    /// Copy a file into the media directory and print its public path
    #[bpaf(command)]
    Copy {
        /// File to copy
        #[bpaf(positional("FILE"))]
        file: PathBuf,
    },

    /// List files in the media directory
    #[bpaf(command)]
    List,

    /// List media files no product or ad refers to
    #[bpaf(command)]
    Orphans {
        /// Delete the orphaned files
        purge: bool,
    },
}

pub fn parse() -> Args {
    args().run()
}
